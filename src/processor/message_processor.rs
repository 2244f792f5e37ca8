use crate::models::downlink::{downlink_topic, DownlinkCommand};
use crate::models::uplink::decode_uplink;
use crate::processor::metrics::SignalMetrics;
use async_trait::async_trait;
use tracing::{debug, info, warn};

/// Outbound transport seam. The live MQTT client implements this; tests use
/// a recording stub so the pipeline runs without a broker.
#[async_trait]
pub trait DownlinkPublisher: Send + Sync {
    /// Fire-and-forget publish (QoS 0, not retained). Does not wait for
    /// broker acknowledgment.
    async fn publish_downlink(&self, topic: &str, body: Vec<u8>) -> anyhow::Result<()>;
}

/// Runs one message through the pipeline: decode/filter, metrics, encode,
/// publish. Per-message failures are logged and swallowed so a bad payload
/// never takes the listener down; only transport errors bubble up to the
/// caller.
pub async fn process_message<P: DownlinkPublisher + ?Sized>(
    publisher: &P,
    application_id: &str,
    payload: &[u8],
) -> anyhow::Result<()> {
    let event = match decode_uplink(payload) {
        Ok(Some(event)) => event,
        Ok(None) => {
            debug!("ignoring non-uplink message on shared topic");
            return Ok(());
        }
        Err(e) => {
            warn!("uplink data corrupted: {}", e);
            return Ok(());
        }
    };

    let metrics = SignalMetrics::from_event(&event);
    let values = metrics.payload_values();

    let command = match DownlinkCommand::new(&event.dev_eui, values) {
        Ok(command) => command,
        Err(e) => {
            warn!("downlink for {} not sent: {}", event.dev_eui, e);
            return Ok(());
        }
    };

    let topic = downlink_topic(application_id, &event.dev_eui);
    let body = serde_json::to_vec(&command)?;
    publisher.publish_downlink(&topic, body).await?;

    info!(
        "scheduled downlink for {}: payload {:?} from {} gateway(s)",
        event.dev_eui, values, metrics.gateway_count
    );

    Ok(())
}
