use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rumqttc::tokio_rustls::rustls::{ClientConfig, RootCertStore};
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS, TlsConfiguration, Transport};
use rustls_pemfile::{certs, private_key};
use sprop_api::models::Actuator;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::configs::{Gateway, GatewayTopic};
use crate::errors::GatewayError;
use crate::services::actuator_service::Command;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// A publish received from the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

#[async_trait]
pub trait CommandPublisher: Send + Sync {
    async fn publish(&self, command: &Command) -> Result<(), GatewayError>;
}

#[derive(Clone)]
pub struct MqttCommandPublisher {
    client: AsyncClient,
    topic: GatewayTopic,
    connected: Arc<AtomicBool>,
}

#[async_trait]
impl CommandPublisher for MqttCommandPublisher {
    async fn publish(&self, command: &Command) -> Result<(), GatewayError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(GatewayError::Disconnected);
        }

        let payload = serde_json::to_vec(&command.payload())?;
        // never wait on the event loop, it may itself be waiting on ingestion
        self.client
            .try_publish(self.topic.command(command.actuator), QoS::AtLeastOnce, false, payload)?;

        Ok(())
    }
}

pub struct GatewayService {
    client: AsyncClient,
    event_loop: EventLoop,
    topic: GatewayTopic,
    connected: Arc<AtomicBool>,
}

impl GatewayService {
    pub fn new(gateway: &Gateway) -> Result<Self, GatewayError> {
        let mut options = MqttOptions::new(&gateway.client_id, &gateway.host, gateway.port);
        options.set_keep_alive(Duration::from_secs(gateway.keep_alive.max(1)));

        if let Some(username) = &gateway.username {
            options.set_credentials(username, gateway.password.clone().unwrap_or_default());
        }

        if gateway.tls || gateway.auth.is_some() {
            options.set_transport(Transport::Tls(tls_configuration(gateway)?));
        }

        let (client, event_loop) = AsyncClient::new(options, 10);

        Ok(Self {
            client,
            event_loop,
            topic: gateway.topic.clone(),
            connected: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn publisher(&self) -> MqttCommandPublisher {
        MqttCommandPublisher {
            client: self.client.clone(),
            topic: self.topic.clone(),
            connected: self.connected.clone(),
        }
    }

    /// Polls the broker connection until the ingestion side hangs up.
    pub fn start(self, sender: mpsc::Sender<InboundMessage>) -> JoinHandle<()> {
        tokio::spawn(self.run(sender))
    }

    async fn run(mut self, sender: mpsc::Sender<InboundMessage>) {
        let mut backoff = INITIAL_BACKOFF;

        loop {
            match self.event_loop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    self.connected.store(true, Ordering::SeqCst);
                    backoff = INITIAL_BACKOFF;
                    info!("connected to broker");

                    // a fresh session carries no subscriptions
                    for topic in subscriptions(&self.topic) {
                        match self.client.try_subscribe(&topic, QoS::AtLeastOnce) {
                            Ok(()) => debug!("subscribe topic {}", topic),
                            Err(e) => error!("failed to subscribe {}: {}", topic, e),
                        }
                    }
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    let message = InboundMessage {
                        topic: publish.topic.clone(),
                        payload: publish.payload.to_vec(),
                    };
                    if sender.send(message).await.is_err() {
                        warn!("ingestion has stopped, closing gateway");
                        break;
                    }
                }
                Ok(Event::Incoming(Packet::Disconnect)) => {
                    self.connected.store(false, Ordering::SeqCst);
                    warn!("broker closed the session");
                }
                Ok(_) => {}
                Err(e) => {
                    self.connected.store(false, Ordering::SeqCst);
                    error!("MQTT connection error: {}, retrying in {:?}", e, backoff);

                    tokio::time::sleep(backoff).await;
                    backoff = next_backoff(backoff);
                }
            }
        }
    }
}

/// Sensor topic followed by one status topic per actuator.
pub fn subscriptions(topic: &GatewayTopic) -> Vec<String> {
    std::iter::once(topic.sensor.clone())
        .chain(Actuator::ALL.into_iter().map(|actuator| topic.status(actuator)))
        .collect()
}

fn next_backoff(current: Duration) -> Duration {
    (current * 2).min(MAX_BACKOFF)
}

fn tls_configuration(gateway: &Gateway) -> Result<TlsConfiguration, GatewayError> {
    let mut root_cert_store = RootCertStore::empty();

    let native = rustls_native_certs::load_native_certs();
    for e in &native.errors {
        warn!("skipping native certificate: {}", e);
    }
    root_cert_store.add_parsable_certificates(native.certs);

    if let Some(ca_path) = &gateway.ca_path {
        let ca = certs(&mut BufReader::new(File::open(ca_path)?)).collect::<Result<Vec<_>, _>>()?;
        root_cert_store.add_parsable_certificates(ca);
    }

    let builder = ClientConfig::builder().with_root_certificates(root_cert_store);

    let config = match &gateway.auth {
        Some(auth) => {
            let chain = certs(&mut BufReader::new(File::open(&auth.cert_path)?)).collect::<Result<Vec<_>, _>>()?;
            let key = private_key(&mut BufReader::new(File::open(&auth.key_path)?))?
                .ok_or_else(|| GatewayError::Tls(format!("no private key found in {}", auth.key_path)))?;

            builder
                .with_client_auth_cert(chain, key)
                .map_err(|e| GatewayError::Tls(e.to_string()))?
        }
        None => builder.with_no_client_auth(),
    };

    Ok(TlsConfiguration::from(config))
}
