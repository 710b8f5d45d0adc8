//! In-memory collaborators shared by the integration tests.
#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use url::Url;

use hoist_core::cancel::{Cancelled, CancellationToken};
use hoist_core::context::InstallerContext;
use hoist_core::discovery::{Discoverer, FileFilterer};
use hoist_core::execution::RecipeExecutor;
use hoist_core::install::{Collaborators, RecipeInstaller};
use hoist_core::recipe::{
    INFRA_AGENT_RECIPE_NAME, LOGGING_RECIPE_NAME, Recipe, RecipeFetcher, RecipeFile,
    RecipeFileFetcher,
};
use hoist_core::status::{RunStatus, StatusEvent, StatusReporter, StatusRollup};
use hoist_core::types::{DiscoveryManifest, LogMatch, RecipeVars};
use hoist_core::ux::{ProgressIndicator, Prompter};
use hoist_core::validation::{RecipeValidator, ValidationError};

pub const DOCS_SEARCH_URL: &str = "https://docs.example.com/search";

/// A recipe that validates with a simple count query.
pub fn recipe(name: &str) -> Recipe {
    Recipe::new(name, name.to_uppercase())
        .with_step(format!("install {name}"))
        .with_validation_nrql(format!("SELECT count(*) FROM {name}"))
}

// =============================================================================
// Discovery
// =============================================================================

#[derive(Default)]
pub struct FakeDiscoverer {
    pub fail: Mutex<bool>,
    pub calls: Mutex<usize>,
}

impl FakeDiscoverer {
    pub fn fail(&self) {
        *self.fail.lock().unwrap() = true;
    }
}

#[async_trait]
impl Discoverer for FakeDiscoverer {
    async fn discover(&self, cancel: &CancellationToken) -> anyhow::Result<DiscoveryManifest> {
        *self.calls.lock().unwrap() += 1;
        if cancel.is_cancelled() {
            return Err(Cancelled.into());
        }
        if *self.fail.lock().unwrap() {
            anyhow::bail!("host facts unavailable");
        }
        let mut manifest = DiscoveryManifest::default().with_platform("ubuntu", "debian");
        manifest.hostname = "web-01".to_string();
        Ok(manifest)
    }
}

#[derive(Default)]
pub struct FakeFileFilterer {
    pub matches: Mutex<Vec<LogMatch>>,
    pub calls: Mutex<usize>,
}

impl FakeFileFilterer {
    pub fn add_match(&self, name: &str, file: &str) {
        self.matches.lock().unwrap().push(LogMatch {
            name: name.to_string(),
            file: file.to_string(),
            pattern: None,
            systemd: None,
            attributes: BTreeMap::new(),
        });
    }
}

#[async_trait]
impl FileFilterer for FakeFileFilterer {
    async fn filter(
        &self,
        _cancel: &CancellationToken,
        _recipes: &[Recipe],
    ) -> anyhow::Result<Vec<LogMatch>> {
        *self.calls.lock().unwrap() += 1;
        Ok(self.matches.lock().unwrap().clone())
    }
}

// =============================================================================
// Recipe sources
// =============================================================================

/// Recipe service holding both prerequisites by default.
pub struct FakeRecipeFetcher {
    pub recipes: Mutex<BTreeMap<String, Recipe>>,
    pub recommendations: Mutex<Vec<Recipe>>,
    pub failing_names: Mutex<BTreeSet<String>>,
    pub fail_recommendations: Mutex<bool>,
    pub fetched_names: Mutex<Vec<String>>,
    pub recommendation_calls: Mutex<usize>,
}

impl Default for FakeRecipeFetcher {
    fn default() -> Self {
        let fetcher = Self {
            recipes: Mutex::new(BTreeMap::new()),
            recommendations: Mutex::new(Vec::new()),
            failing_names: Mutex::new(BTreeSet::new()),
            fail_recommendations: Mutex::new(false),
            fetched_names: Mutex::new(Vec::new()),
            recommendation_calls: Mutex::new(0),
        };
        fetcher.add(recipe(INFRA_AGENT_RECIPE_NAME));
        fetcher.add(recipe(LOGGING_RECIPE_NAME));
        fetcher
    }
}

impl FakeRecipeFetcher {
    pub fn add(&self, recipe: Recipe) {
        self.recipes
            .lock()
            .unwrap()
            .insert(recipe.name.clone(), recipe);
    }

    pub fn remove(&self, name: &str) {
        self.recipes.lock().unwrap().remove(name);
    }

    pub fn recommend(&self, recipe: Recipe) {
        self.recommendations.lock().unwrap().push(recipe);
    }

    pub fn fail_name(&self, name: &str) {
        self.failing_names.lock().unwrap().insert(name.to_string());
    }
}

#[async_trait]
impl RecipeFetcher for FakeRecipeFetcher {
    async fn fetch_recipe(
        &self,
        _cancel: &CancellationToken,
        _manifest: &DiscoveryManifest,
        name: &str,
    ) -> anyhow::Result<Option<Recipe>> {
        self.fetched_names.lock().unwrap().push(name.to_string());
        if self.failing_names.lock().unwrap().contains(name) {
            anyhow::bail!("recipe service unavailable");
        }
        Ok(self.recipes.lock().unwrap().get(name).cloned())
    }

    async fn fetch_recommendations(
        &self,
        _cancel: &CancellationToken,
        _manifest: &DiscoveryManifest,
    ) -> anyhow::Result<Vec<Recipe>> {
        *self.recommendation_calls.lock().unwrap() += 1;
        if *self.fail_recommendations.lock().unwrap() {
            anyhow::bail!("recommendation service unavailable");
        }
        Ok(self.recommendations.lock().unwrap().clone())
    }

    async fn fetch_recipes(&self, _cancel: &CancellationToken) -> anyhow::Result<Vec<Recipe>> {
        Ok(self.recipes.lock().unwrap().values().cloned().collect())
    }
}

/// Recipe files keyed by the raw path or URL string.
#[derive(Default)]
pub struct FakeRecipeFileFetcher {
    pub files: Mutex<BTreeMap<String, RecipeFile>>,
}

impl FakeRecipeFileFetcher {
    pub fn add_yaml(&self, location: &str, yaml: &str) {
        let file = RecipeFile::parse(yaml).expect("test recipe file should parse");
        self.files
            .lock()
            .unwrap()
            .insert(location.to_string(), file);
    }

    fn lookup(&self, key: &str) -> anyhow::Result<RecipeFile> {
        self.files
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no such recipe file: {}", key))
    }
}

#[async_trait]
impl RecipeFileFetcher for FakeRecipeFileFetcher {
    async fn fetch_recipe_file(
        &self,
        _cancel: &CancellationToken,
        url: &Url,
    ) -> anyhow::Result<RecipeFile> {
        self.lookup(url.as_str())
    }

    fn load_recipe_file(&self, path: &Path) -> anyhow::Result<RecipeFile> {
        self.lookup(&path.to_string_lossy())
    }
}

// =============================================================================
// Execution and validation
// =============================================================================

#[derive(Default)]
pub struct FakeExecutor {
    pub failing_prepare: Mutex<BTreeSet<String>>,
    pub failing_execute: Mutex<BTreeSet<String>>,
    /// Recipes whose execution cancels the run.
    pub cancelling: Mutex<BTreeSet<String>>,
    pub executed: Mutex<Vec<Recipe>>,
}

impl FakeExecutor {
    pub fn fail_prepare(&self, name: &str) {
        self.failing_prepare.lock().unwrap().insert(name.to_string());
    }

    pub fn fail_execute(&self, name: &str) {
        self.failing_execute.lock().unwrap().insert(name.to_string());
    }

    pub fn cancel_on(&self, name: &str) {
        self.cancelling.lock().unwrap().insert(name.to_string());
    }

    pub fn executed_names(&self) -> Vec<String> {
        self.executed
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.name.clone())
            .collect()
    }

    pub fn executed_recipe(&self, name: &str) -> Option<Recipe> {
        self.executed
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.name == name)
            .cloned()
    }
}

#[async_trait]
impl RecipeExecutor for FakeExecutor {
    async fn prepare(
        &self,
        _cancel: &CancellationToken,
        _manifest: &DiscoveryManifest,
        recipe: &Recipe,
        _assume_yes: bool,
    ) -> anyhow::Result<RecipeVars> {
        if self.failing_prepare.lock().unwrap().contains(&recipe.name) {
            anyhow::bail!("missing required variable");
        }
        Ok(recipe
            .vars()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    async fn execute(
        &self,
        cancel: &CancellationToken,
        _manifest: &DiscoveryManifest,
        recipe: &Recipe,
        _vars: &RecipeVars,
    ) -> anyhow::Result<()> {
        self.executed.lock().unwrap().push(recipe.clone());
        if self.cancelling.lock().unwrap().contains(&recipe.name) {
            cancel.cancel();
            return Err(Cancelled.into());
        }
        if self.failing_execute.lock().unwrap().contains(&recipe.name) {
            anyhow::bail!("step exited with status 1");
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeValidator {
    pub failing: Mutex<BTreeSet<String>>,
    pub without_guid: Mutex<BTreeSet<String>>,
    pub validated: Mutex<Vec<String>>,
}

impl FakeValidator {
    pub fn fail(&self, name: &str) {
        self.failing.lock().unwrap().insert(name.to_string());
    }

    /// Report data for `name` without an entity GUID.
    pub fn omit_guid(&self, name: &str) {
        self.without_guid.lock().unwrap().insert(name.to_string());
    }

    pub fn validated_names(&self) -> Vec<String> {
        self.validated.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecipeValidator for FakeValidator {
    async fn validate(
        &self,
        _cancel: &CancellationToken,
        _manifest: &DiscoveryManifest,
        recipe: &Recipe,
    ) -> Result<Option<String>, ValidationError> {
        self.validated.lock().unwrap().push(recipe.name.clone());
        if self.failing.lock().unwrap().contains(&recipe.name) {
            return Err(ValidationError::Backend("query rejected".to_string()));
        }
        if self.without_guid.lock().unwrap().contains(&recipe.name) {
            return Ok(None);
        }
        Ok(Some(format!("guid-{}", recipe.name)))
    }
}

// =============================================================================
// Interaction
// =============================================================================

/// Answers yes to everything except messages containing a declined fragment.
#[derive(Default)]
pub struct ScriptedPrompter {
    pub declined: Mutex<Vec<String>>,
    pub fail: Mutex<bool>,
    pub asked: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn decline(&self, fragment: &str) {
        self.declined.lock().unwrap().push(fragment.to_string());
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }
}

impl Prompter for ScriptedPrompter {
    fn prompt_yes_no(&self, msg: &str) -> anyhow::Result<bool> {
        self.asked.lock().unwrap().push(msg.to_string());
        if *self.fail.lock().unwrap() {
            anyhow::bail!("terminal closed");
        }
        let declined = self
            .declined
            .lock()
            .unwrap()
            .iter()
            .any(|fragment| msg.contains(fragment.as_str()));
        Ok(!declined)
    }

    fn multi_select(&self, _msg: &str, options: &[String]) -> anyhow::Result<Vec<String>> {
        Ok(options.to_vec())
    }
}

#[derive(Default)]
pub struct RecordingProgress {
    pub events: Mutex<Vec<String>>,
}

impl RecordingProgress {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl ProgressIndicator for RecordingProgress {
    fn start(&self, label: &str) {
        self.events.lock().unwrap().push(format!("start:{label}"));
    }

    fn success(&self) {
        self.events.lock().unwrap().push("success".to_string());
    }

    fn fail(&self) {
        self.events.lock().unwrap().push("fail".to_string());
    }

    fn stop(&self) {
        self.events.lock().unwrap().push("stop".to_string());
    }
}

/// Records `kind` or `kind:name` for every event it receives.
#[derive(Clone, Default)]
pub struct RecordingReporter {
    pub events: Arc<Mutex<Vec<String>>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, kind: &str) -> usize {
        self.events()
            .iter()
            .filter(|e| e.split(':').next() == Some(kind))
            .count()
    }
}

#[async_trait]
impl StatusReporter for RecordingReporter {
    fn name(&self) -> &str {
        "recording"
    }

    async fn report(&self, event: &StatusEvent<'_>, _status: &RunStatus) -> anyhow::Result<()> {
        let entry = match event {
            StatusEvent::RecipesAvailable(recipes) => {
                let names: Vec<&str> = recipes.iter().map(|r| r.name.as_str()).collect();
                format!("{}:{}", event.kind(), names.join(","))
            }
            StatusEvent::RecipeAvailable(recipe) => format!("{}:{}", event.kind(), recipe.name),
            StatusEvent::RecipeInstalling(e)
            | StatusEvent::RecipeInstalled(e)
            | StatusEvent::RecipeFailed(e)
            | StatusEvent::RecipeSkipped(e) => format!("{}:{}", event.kind(), e.recipe.name),
            StatusEvent::Complete => event.kind().to_string(),
        };
        self.events.lock().unwrap().push(entry);
        Ok(())
    }
}

// =============================================================================
// Harness
// =============================================================================

/// All fakes for one run, kept so tests can inspect them afterwards.
#[derive(Default)]
pub struct Harness {
    pub discoverer: Arc<FakeDiscoverer>,
    pub file_filterer: Arc<FakeFileFilterer>,
    pub fetcher: Arc<FakeRecipeFetcher>,
    pub file_fetcher: Arc<FakeRecipeFileFetcher>,
    pub executor: Arc<FakeExecutor>,
    pub validator: Arc<FakeValidator>,
    pub prompter: Arc<ScriptedPrompter>,
    pub progress: Arc<RecordingProgress>,
    pub reporter: RecordingReporter,
    pub cancel: CancellationToken,
}

impl Harness {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn installer(&self, context: InstallerContext) -> RecipeInstaller {
        let collaborators = Collaborators {
            discoverer: self.discoverer.clone(),
            file_filterer: self.file_filterer.clone(),
            recipe_fetcher: self.fetcher.clone(),
            recipe_file_fetcher: self.file_fetcher.clone(),
            recipe_executor: self.executor.clone(),
            recipe_validator: self.validator.clone(),
            prompter: self.prompter.clone(),
            progress: self.progress.clone(),
        };
        let status = StatusRollup::new(vec![Box::new(self.reporter.clone())]);

        RecipeInstaller::new(
            context,
            collaborators,
            status,
            self.cancel.clone(),
            Url::parse(DOCS_SEARCH_URL).unwrap(),
        )
    }
}
