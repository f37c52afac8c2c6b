use crate::{
    config::Config,
    error::Result,
    routes::api_routes,
    services::{
        CorpusStore, CoverService, HistoryLedger, OpenAiClient, PineconeClient, PineconeIndex,
        RecommendationComposer, RecommendationService,
    },
};
use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use log::info;
use std::{net::TcpListener, sync::Arc};

pub struct Application {
    port: u16,
    host: String,
    config: Config,
}

/// Long-lived services shared by every worker.
#[derive(Clone)]
pub struct AppServices {
    pub recommendations: web::Data<RecommendationService>,
    pub covers: web::Data<CoverService>,
    pub history: web::Data<HistoryLedger>,
}

impl AppServices {
    /// Build every client and service once, from configuration.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let corpus = Arc::new(CorpusStore::load(&config.corpus_path)?);
        let history = HistoryLedger::connect(&config.database_url).await?;

        let openai = Arc::new(OpenAiClient::new(config)?);
        let pinecone =
            PineconeClient::from_config(config).context("Failed to initialize Pinecone client")?;
        let index = Arc::new(PineconeIndex::new(openai.clone(), pinecone));

        let recommendations = RecommendationService::new(
            index,
            RecommendationComposer::new(openai.clone()),
            corpus,
            history.clone(),
        );

        Ok(Self {
            recommendations: web::Data::new(recommendations),
            covers: web::Data::new(CoverService::new(openai)),
            history: web::Data::new(history),
        })
    }
}

impl Application {
    /// Create a new application instance
    pub fn new(config: &Config) -> Self {
        Self {
            port: config.port,
            host: config.host.clone(),
            config: config.clone(),
        }
    }

    /// Build and run the server
    pub async fn run(&self) -> Result<()> {
        let bind_address = format!("{}:{}", self.host, self.port);
        let listener = TcpListener::bind(&bind_address)?;
        info!("Starting server at http://{}", bind_address);

        self.run_with_listener(listener).await
    }

    /// Run the server with a specific TCP listener
    /// This is useful for testing where we want to use a random port
    pub async fn run_with_listener(&self, listener: TcpListener) -> Result<()> {
        let services = AppServices::from_config(&self.config).await?;
        let origins = self.config.allowed_origins();

        HttpServer::new(move || {
            App::new()
                .wrap(cors(&origins))
                .wrap(Logger::default())
                .app_data(services.recommendations.clone())
                .app_data(services.covers.clone())
                .app_data(services.history.clone())
                .configure(api_routes)
        })
        .listen(listener)?
        .run()
        .await?;

        Ok(())
    }
}

fn cors(origins: &[String]) -> Cors {
    if origins.is_empty() {
        return Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header();
    }

    origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allow_any_method()
        .allow_any_header()
        .supports_credentials()
}
