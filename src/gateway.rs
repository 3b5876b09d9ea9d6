use crate::config::GatewayConfig;
use crate::dispatcher::{Application, RequestDispatcher};
use crate::request::{EnvironmentBuilder, MultipartParser};
use crate::router::RouteClassifier;
use crate::server::{GatewayService, HttpServer, ServerFault, ServerHandle};
use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

/// A configured gateway ready to serve: config, initialized application and
/// the dispatcher built from both.
pub struct Gateway {
    config: GatewayConfig,
    dispatcher: Arc<RequestDispatcher>,
}

impl Gateway {
    /// Initialize `application` with `config` and assemble the dispatcher.
    ///
    /// # Errors
    ///
    /// Fails when the application refuses to initialize or the options are invalid.
    pub fn new<A: Application + 'static>(
        config: GatewayConfig,
        mut application: A,
    ) -> anyhow::Result<Self> {
        let backlog = config
            .options
            .backlog()
            .context("invalid server options")?;
        application
            .initialize(&config)
            .context("application failed to initialize")?;

        let mut environment = EnvironmentBuilder::new().fallback_host(config.server_name.clone());
        if let Ok(addr) = config.listen_addr().parse::<SocketAddr>() {
            environment = environment.listen_addr(addr);
        }
        if let Some(dir) = &config.upload_dir {
            environment = environment.multipart_parser(MultipartParser::with_temp_dir(dir));
        }

        let classifier = RouteClassifier::new(config.actions.action_table());
        let dispatcher =
            RequestDispatcher::new(environment, classifier, &config.base_dir, Arc::new(application));

        if !config.base_dir.is_dir() {
            warn!(base_dir = %config.base_dir.display(), "Base directory does not exist, no static files will be served");
        }
        info!(
            listen = %config.listen_addr(),
            base_dir = %config.base_dir.display(),
            backlog,
            "Gateway configured"
        );

        Ok(Self {
            config,
            dispatcher: Arc::new(dispatcher),
        })
    }

    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    #[must_use]
    pub fn dispatcher(&self) -> Arc<RequestDispatcher> {
        Arc::clone(&self.dispatcher)
    }

    /// Start listening on the configured host and port.
    ///
    /// # Errors
    ///
    /// See [`HttpServer::start`].
    pub fn start(&self) -> Result<ServerHandle, ServerFault> {
        self.start_on(self.config.listen_addr())
    }

    /// Start listening on `addr`, ignoring the configured host and port.
    ///
    /// # Errors
    ///
    /// See [`HttpServer::start`].
    pub fn start_on(&self, addr: impl std::net::ToSocketAddrs) -> Result<ServerHandle, ServerFault> {
        HttpServer(GatewayService::new(self.dispatcher())).start(addr)
    }
}
