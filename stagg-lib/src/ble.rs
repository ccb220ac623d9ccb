use crate::constants::{CANDIDATE_SERVICE_UUIDS, KETTLE_NAME_PREFIXES, MAIN_CONFIG_UUID};
use crate::error::TransportError;
use crate::transport::Transport;
use btleplug::api::{Central, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType};
use btleplug::platform::{Adapter, Manager, Peripheral};
use bytes::Bytes;
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info};
use uuid::Uuid;

// Bounded waits for GATT operations; an unacknowledged write surfaces as a
// timeout error rather than hanging the sequencer.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
const SCAN_WINDOW: Duration = Duration::from_secs(5);

fn parse_uuid(s: &str) -> Uuid {
    Uuid::parse_str(s).expect("invalid UUID constant")
}

/// BLE implementation of [`Transport`] over the kettle's main configuration
/// characteristic.
pub struct BleTransport {
    peripheral: Peripheral,
    characteristic: Characteristic,
}

impl BleTransport {
    /// Scan for a kettle and connect to its configuration characteristic.
    ///
    /// `target` narrows the scan to a name or address fragment; without it
    /// the first peripheral advertising one of the known kettle name
    /// prefixes wins.
    pub async fn connect(target: Option<&str>) -> Result<Self, TransportError> {
        let adapter = default_adapter().await?;

        info!("scanning for kettle...");
        adapter.start_scan(ScanFilter::default()).await?;
        tokio::time::sleep(SCAN_WINDOW).await;
        let found = find_kettle(&adapter, target).await;
        adapter.stop_scan().await?;
        let peripheral = found?;

        peripheral.connect().await?;
        peripheral.discover_services().await?;
        let characteristic = locate_config_characteristic(&peripheral)?;
        info!(
            address = %peripheral.address(),
            service = %characteristic.service_uuid,
            "connected to main configuration characteristic"
        );

        Ok(Self {
            peripheral,
            characteristic,
        })
    }

    pub async fn disconnect(&self) -> Result<(), TransportError> {
        self.peripheral.disconnect().await?;
        Ok(())
    }
}

async fn default_adapter() -> Result<Adapter, TransportError> {
    let manager = Manager::new().await?;
    let adapters = manager.adapters().await?;
    adapters
        .into_iter()
        .next()
        .ok_or(TransportError::AdapterNotFound)
}

async fn find_kettle(adapter: &Adapter, target: Option<&str>) -> Result<Peripheral, TransportError> {
    for peripheral in adapter.peripherals().await? {
        let Some(props) = peripheral.properties().await? else {
            continue;
        };
        let name = props.local_name.unwrap_or_default();
        let address = peripheral.address().to_string();

        let matches = match target {
            Some(t) => name.contains(t) || address.contains(t),
            None => KETTLE_NAME_PREFIXES.iter().any(|p| name.starts_with(p)),
        };
        if matches {
            debug!(%name, %address, rssi = ?props.rssi, "kettle candidate");
            return Ok(peripheral);
        }
    }
    Err(TransportError::DeviceNotFound)
}

/// The configuration characteristic has a fixed UUID but firmware variants
/// hang it off different parent services; try them in priority order.
fn locate_config_characteristic(
    peripheral: &Peripheral,
) -> Result<Characteristic, TransportError> {
    let config_uuid = parse_uuid(MAIN_CONFIG_UUID);
    let characteristics = peripheral.characteristics();
    for service in CANDIDATE_SERVICE_UUIDS {
        let service_uuid = parse_uuid(service);
        if let Some(found) = characteristics
            .iter()
            .find(|c| c.uuid == config_uuid && c.service_uuid == service_uuid)
        {
            return Ok(found.clone());
        }
    }
    Err(TransportError::CharacteristicNotFound)
}

impl Transport for BleTransport {
    async fn read(&self) -> Result<Bytes, TransportError> {
        let value = timeout(DEFAULT_TIMEOUT, self.peripheral.read(&self.characteristic)).await??;
        debug!(len = value.len(), "read characteristic");
        Ok(Bytes::from(value))
    }

    async fn write(&self, frame: &[u8]) -> Result<(), TransportError> {
        timeout(
            DEFAULT_TIMEOUT,
            self.peripheral
                .write(&self.characteristic, frame, WriteType::WithResponse),
        )
        .await??;
        debug!(len = frame.len(), "wrote characteristic");
        Ok(())
    }

    async fn subscribe(&self) -> Result<mpsc::Receiver<Bytes>, TransportError> {
        self.peripheral.subscribe(&self.characteristic).await?;
        let mut notifications = self.peripheral.notifications().await?;
        let uuid = self.characteristic.uuid;
        let (tx, rx) = mpsc::channel(16);
        tokio::spawn(async move {
            while let Some(notification) = notifications.next().await {
                if notification.uuid != uuid {
                    continue;
                }
                if tx.send(Bytes::from(notification.value)).await.is_err() {
                    break;
                }
            }
        });
        Ok(rx)
    }
}
