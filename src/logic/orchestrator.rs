use crate::config::Config;
use crate::datasources::ProviderSet;
use crate::error::Result;
use crate::logic::composer::{ResponseComposer, Unanswered};
use crate::logic::fusion::{DataFusionEngine, DefaultLocationMemo};
use crate::logic::intent::{IntentClassifier, QueryMentions};
use crate::logic::resolver::RegionResolver;
use crate::logic::rules::RecommendationEngine;
use crate::models::{Location, QueryResponse, ValidatedQuery};
use chrono::NaiveDate;
use std::time::Duration;

/// Everything one query produced: the responses in resolution order, plus
/// the names of locations dropped because no provider answered for them.
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub responses: Vec<QueryResponse>,
    pub omitted: Vec<String>,
}

/// Drives a query through resolution, fusion, classification,
/// recommendation and composition.
pub struct QueryOrchestrator {
    resolver: RegionResolver,
    fusion: DataFusionEngine,
    classifier: IntentClassifier,
    engine: RecommendationEngine,
    composer: ResponseComposer,
    default_location: Option<Location>,
}

impl QueryOrchestrator {
    pub fn new(providers: &ProviderSet, timeout: Duration) -> Self {
        Self {
            resolver: RegionResolver::new(providers.geocoder.clone(), timeout),
            fusion: DataFusionEngine::from_providers(providers, timeout),
            classifier: IntentClassifier::new(),
            engine: RecommendationEngine::new(providers.market.clone(), providers.catalog.clone()),
            composer: ResponseComposer::new(),
            default_location: None,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let providers = ProviderSet::from_config(&config.providers)?;
        let mut orchestrator = Self::new(&providers, config.providers.timeout());

        let default_location = config.defaults.location();
        if config.defaults.memoize {
            tracing::info!("Memoizing fused data for {}", default_location);
            let memo = DefaultLocationMemo::new(default_location.clone());
            orchestrator = orchestrator.with_memo(memo);
        }
        if config.defaults.fallback_to_default {
            orchestrator = orchestrator.with_default_location(default_location);
        }
        Ok(orchestrator)
    }

    pub fn with_memo(mut self, memo: DefaultLocationMemo) -> Self {
        self.fusion = self.fusion.with_memo(memo);
        self
    }

    /// Location answered on the single-response path when a query names nowhere.
    pub fn with_default_location(mut self, location: Location) -> Self {
        self.default_location = Some(location);
        self
    }

    pub fn resolver(&self) -> &RegionResolver {
        &self.resolver
    }

    pub fn fusion(&self) -> &DataFusionEngine {
        &self.fusion
    }

    pub fn classifier(&self) -> &IntentClassifier {
        &self.classifier
    }

    pub fn engine(&self) -> &RecommendationEngine {
        &self.engine
    }

    /// One response per resolved location, in resolution order.
    pub async fn handle(&self, query: &ValidatedQuery) -> Vec<QueryResponse> {
        self.handle_detailed(query).await.responses
    }

    pub async fn handle_detailed(&self, query: &ValidatedQuery) -> QueryOutcome {
        self.handle_on(query, today()).await
    }

    pub async fn handle_on(&self, query: &ValidatedQuery, today: NaiveDate) -> QueryOutcome {
        let intent = self.classifier.classify(&query.text);
        let locations = self
            .resolver
            .resolve_with_hint(&query.text, query.hint)
            .await;
        tracing::info!(
            intent = %intent,
            locations = locations.len(),
            "Processing query"
        );

        let mentions = QueryMentions::extract(&query.text);
        let fused = self.fusion.fuse_many(&locations).await;

        let mut responses = Vec::with_capacity(locations.len());
        let mut omitted = Vec::new();
        for (location, record) in locations.iter().zip(fused) {
            match record {
                Ok(record) => {
                    let result = self.engine.run(intent, &record, &mentions, today);
                    let profile = self.engine.region_profile(&record);
                    responses.push(self.composer.compose(
                        &query.text,
                        intent,
                        &record,
                        &result,
                        profile.as_ref(),
                    ));
                }
                Err(e) => {
                    tracing::warn!("Omitting {}: {}", location, e);
                    omitted.push(location.name.clone());
                }
            }
        }

        QueryOutcome { responses, omitted }
    }

    /// Single answer for the first place the query names, else the hint, else
    /// the default location. Never fails: when nothing resolves or no provider
    /// answers, the response explains why instead.
    pub async fn respond(&self, query: &ValidatedQuery) -> QueryResponse {
        self.respond_on(query, today()).await
    }

    pub async fn respond_on(&self, query: &ValidatedQuery, today: NaiveDate) -> QueryResponse {
        let resolved = self
            .resolver
            .resolve_with_hint(&query.text, query.hint)
            .await
            .into_iter()
            .next();
        let location = match (resolved, &self.default_location) {
            (Some(location), _) => location,
            (None, Some(default)) => {
                tracing::debug!("Nothing resolved, using default location {}", default);
                default.clone()
            }
            (None, None) => {
                tracing::info!("No location found for query");
                let intent = self.classifier.classify(&query.text);
                return self
                    .composer
                    .unanswered(&query.text, intent, &Unanswered::NoLocation);
            }
        };

        match self.respond_at(&query.text, &location, today).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("No readings for {}: {}", location, e);
                let intent = self.classifier.classify(&query.text);
                self.composer
                    .unanswered(&query.text, intent, &Unanswered::NoReadings(location))
            }
        }
    }

    /// Answers `text` for an already-resolved location.
    pub async fn respond_at(
        &self,
        text: &str,
        location: &Location,
        today: NaiveDate,
    ) -> Result<QueryResponse> {
        let intent = self.classifier.classify(text);
        tracing::info!(intent = %intent, location = %location, "Processing query");

        let record = self.fusion.fuse(location).await?;
        let mentions = QueryMentions::extract(text);
        let result = self.engine.run(intent, &record, &mentions, today);
        let profile = self.engine.region_profile(&record);
        Ok(self
            .composer
            .compose(text, intent, &record, &result, profile.as_ref()))
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
