use crate::config::AppConfig;
use crate::processor::message_processor::{self, DownlinkPublisher};
use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use std::time::Duration;
use tracing::{debug, error, info};
use uuid::Uuid;

#[async_trait]
impl DownlinkPublisher for AsyncClient {
    async fn publish_downlink(&self, topic: &str, body: Vec<u8>) -> anyhow::Result<()> {
        self.publish(topic, QoS::AtMostOnce, false, body).await?;
        Ok(())
    }
}

pub async fn start_mqtt_client(config: &AppConfig) -> anyhow::Result<()> {
    let client_id = format!("fieldtester-bridge-{}", Uuid::new_v4());
    let mut mqttoptions = MqttOptions::new(client_id, &config.mqtt_broker, config.mqtt_port);
    mqttoptions.set_keep_alive(Duration::from_secs(5));
    if !config.mqtt_username.is_empty() {
        mqttoptions.set_credentials(&config.mqtt_username, &config.mqtt_password);
    }

    let (client, mut eventloop) = AsyncClient::new(mqttoptions, 100);
    let topic = config.uplink_topic();

    loop {
        match eventloop.poll().await {
            Ok(notification) => match notification {
                Event::Incoming(Packet::ConnAck(_)) => {
                    info!("MQTT connected, subscribing to {}", topic);
                    // Subscriptions do not survive a reconnect; renew on
                    // every ConnAck.
                    client.subscribe(&topic, QoS::AtMostOnce).await?;
                }
                Event::Incoming(Packet::SubAck(_)) => {
                    info!("Subscription confirmed");
                }
                Event::Incoming(Packet::Publish(publish)) => {
                    debug!(
                        "message on {} ({} bytes)",
                        publish.topic,
                        publish.payload.len()
                    );
                    let client = client.clone();
                    let application_id = config.application_id.clone();
                    tokio::spawn(async move {
                        if let Err(e) = message_processor::process_message(
                            &client,
                            &application_id,
                            &publish.payload,
                        )
                        .await
                        {
                            error!("Error processing message: {}", e);
                        }
                    });
                }
                _ => {}
            },
            Err(e) => {
                error!("MQTT connection error: {}", e);
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }
}
