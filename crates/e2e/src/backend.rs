//! API flow: register, log in, create a product, then clean up

use std::fmt;
use std::time::Duration;

use agrored_report::{Scenario, StepFailure, StepResult, TestRun};
use async_trait::async_trait;

use crate::api::{document_id, ApiClient, NewProduct};
use crate::config::BackendConfig;
use crate::error::E2eError;
use crate::identity::random_email;

const USER: &str = "user";
const PRODUCT: &str = "product";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendStep {
    RegisterUser,
    Login,
    CreateProduct,
    VerifyProductListed,
    FetchUser,
}

impl fmt::Display for BackendStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BackendStep::RegisterUser => "User registration",
            BackendStep::Login => "User login",
            BackendStep::CreateProduct => "Product creation",
            BackendStep::VerifyProductListed => "Product verification",
            BackendStep::FetchUser => "Get user by ID",
        };
        f.write_str(s)
    }
}

pub struct BackendScenario {
    /// Client construction errors surface as a failure of the first step
    api: Result<ApiClient, String>,
    config: BackendConfig,
    email: String,
    product_name: String,
    user_id: Option<String>,
    access_token: Option<String>,
    product_id: Option<String>,
}

impl BackendScenario {
    pub fn new(config: BackendConfig) -> Self {
        let api = ApiClient::new(&config.base_url, Duration::from_secs(config.request_timeout_secs))
            .map_err(|e| e.to_string());
        Self {
            api,
            config,
            email: random_email(),
            product_name: "Tomate Orgánico".to_string(),
            user_id: None,
            access_token: None,
            product_id: None,
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    fn api(&self) -> Result<&ApiClient, StepFailure> {
        self.api
            .as_ref()
            .map_err(|e| StepFailure::Transport(format!("API client unavailable: {}", e)))
    }

    fn token(&self) -> Result<&str, StepFailure> {
        self.access_token
            .as_deref()
            .ok_or_else(|| StepFailure::assertion("no access token; login did not succeed"))
    }

    fn user(&self) -> Result<&str, StepFailure> {
        self.user_id
            .as_deref()
            .ok_or_else(|| StepFailure::assertion("no user id; registration did not succeed"))
    }

    async fn register_user(&mut self, run: &mut TestRun) -> StepResult {
        let user = self
            .api()?
            .register_user(&self.config.full_name, &self.email, &self.config.password)
            .await?;

        let Some(id) = document_id(&user) else {
            run.record(format!(
                "⚠️ User registration '{}': PASSED (no ID). Expected: valid user ID. Result: ID not found. Full response: {}",
                self.email, user
            ));
            return Err(StepFailure::assertion("user_id is None after registration"));
        };

        run.pass(format!(
            "✅ User registration '{}': PASSED. Expected: user created with ID. Result: {}",
            self.email, id
        ));
        run.track_artifact(USER, id.clone());
        self.user_id = Some(id);
        run.pass("Assertion: User ID is not None: PASSED. Expected: valid user ID.");
        Ok(())
    }

    async fn login(&mut self, run: &mut TestRun) -> StepResult {
        let token = self.api()?.login(&self.email, &self.config.password).await?;
        if token.access_token.is_empty() {
            return Err(StepFailure::assertion("access_token is empty"));
        }

        run.pass(format!(
            "✅ User login '{}': PASSED. Expected: access token. Result: token type: {}",
            self.email, token.token_type
        ));
        self.access_token = Some(token.access_token);
        run.pass("Assertion: Access Token is not None: PASSED. Expected: valid access token.");
        Ok(())
    }

    async fn create_product(&mut self, run: &mut TestRun) -> StepResult {
        let token = self.token()?;
        let product = self
            .api()?
            .create_product(token, &NewProduct::named(self.product_name.as_str()))
            .await?;

        let Some(id) = document_id(&product) else {
            run.record(format!(
                "⚠️ Product creation '{}': PASSED (no ID). Expected: valid product ID. Result: ID not found. Full response: {}",
                self.product_name, product
            ));
            return Err(StepFailure::assertion("product_id is None after creation"));
        };

        run.pass(format!(
            "✅ Product creation '{}': PASSED. Expected: product created with ID. Result: {}",
            self.product_name, id
        ));
        run.track_artifact(PRODUCT, id.clone());
        self.product_id = Some(id);
        run.pass("Assertion: Product ID is not None: PASSED. Expected: valid product ID.");
        Ok(())
    }

    async fn verify_product_listed(&mut self, run: &mut TestRun) -> StepResult {
        let user_id = self.user()?;
        let product_id = self
            .product_id
            .as_deref()
            .ok_or_else(|| StepFailure::assertion("no product id; creation did not succeed"))?;

        let products = self.api()?.list_products().await?;
        let listed = products.iter().any(|p| {
            p.get("owner_id").and_then(|o| o.as_str()) == Some(user_id)
                && document_id(p).as_deref() == Some(product_id)
        });
        if !listed {
            return Err(StepFailure::assertion(format!(
                "product {} is not listed or not owned by user {}",
                product_id, user_id
            )));
        }

        run.pass("✅ Product registration and ownership check: PASSED. Expected: product found and owned by the user.");
        Ok(())
    }

    async fn fetch_user(&mut self, run: &mut TestRun) -> StepResult {
        let user_id = self.user()?;
        let token = self.token()?;

        match self.api()?.get_user(user_id, token).await? {
            Some(user) if document_id(&user).as_deref() == Some(user_id) => {
                run.pass(format!(
                    "✅ Verification: user with ID {} retrieved: PASSED. Expected: user data with matching ID.",
                    user_id
                ));
                Ok(())
            }
            _ => Err(StepFailure::assertion(format!(
                "could not fetch user {} or the ID does not match",
                user_id
            ))),
        }
    }

    async fn cleanup_product(&self, api: &ApiClient, run: &mut TestRun, id: &str) {
        let Some(token) = self.access_token.as_deref() else {
            run.fail(format!(
                "❌ Verification: product with ID {} NOT deleted: no access token. Expected: product not found after deletion.",
                id
            ));
            return;
        };

        if let Err(e) = api.delete_product(token, id).await {
            run.fail(format!(
                "❌ Product deletion (ID: {}): FAILED - {}. Expected: 204 No Content.",
                id, e
            ));
            run.fail(format!(
                "❌ Verification: product with ID {} NOT deleted correctly. Expected: product not found after deletion.",
                id
            ));
            return;
        }
        run.pass(format!(
            "🗑️ Product deletion (ID: {}): PASSED. Expected: 204 No Content. Result: deleted.",
            id
        ));

        match api.get_product(id).await {
            Ok(None) => run.pass(format!(
                "✅ Verification: product with ID {} deleted and not found: PASSED. Expected: product not found after deletion.",
                id
            )),
            Ok(Some(_)) => run.fail(format!(
                "❌ Verification: deleted product (ID: {}) is still present: FAILED. Expected: product not found after deletion.",
                id
            )),
            Err(e) => run.fail(format!(
                "❌ Verification: product with ID {} could not be checked: FAILED - {}",
                id, e
            )),
        }
    }

    async fn cleanup_user(&self, api: &ApiClient, run: &mut TestRun, id: &str) {
        let Some(token) = self.access_token.as_deref() else {
            run.fail(format!("❌ User deletion (ID: {}): FAILED - no access token.", id));
            return;
        };

        if let Err(e) = api.delete_user(token, id).await {
            run.fail(format!(
                "❌ User deletion (ID: {}): FAILED - {}. Expected: 204 No Content.",
                id, e
            ));
            return;
        }
        run.pass(format!(
            "🗑️ User deletion (ID: {}): PASSED. Expected: 204 No Content. Result: deleted.",
            id
        ));

        match api.get_user(id, token).await {
            Ok(Some(_)) => run.fail(format!(
                "❌ Verification: deleted user (ID: {}) is still present: FAILED.",
                id
            )),
            // a deleted user's token may be rejected outright, which also means gone
            Ok(None) | Err(E2eError::Status { status: 401, .. }) => run.pass(format!(
                "✅ Verification: user with ID {} deleted and not found: PASSED. Expected: user not found after deletion.",
                id
            )),
            Err(e) => run.fail(format!(
                "❌ Verification: user with ID {} could not be checked: FAILED - {}",
                id, e
            )),
        }
    }
}

#[async_trait]
impl Scenario for BackendScenario {
    type Step = BackendStep;

    fn name(&self) -> &str {
        "backend"
    }

    fn plan(&self) -> Vec<BackendStep> {
        let mut steps = vec![
            BackendStep::RegisterUser,
            BackendStep::Login,
            BackendStep::CreateProduct,
        ];
        if self.config.extended_checks {
            steps.extend([BackendStep::VerifyProductListed, BackendStep::FetchUser]);
        }
        steps
    }

    async fn execute(&mut self, step: BackendStep, run: &mut TestRun) -> StepResult {
        match step {
            BackendStep::RegisterUser => self.register_user(run).await,
            BackendStep::Login => self.login(run).await,
            BackendStep::CreateProduct => self.create_product(run).await,
            BackendStep::VerifyProductListed => self.verify_product_listed(run).await,
            BackendStep::FetchUser => self.fetch_user(run).await,
        }
    }

    async fn finalize(&mut self, run: &mut TestRun) {
        // nothing can have been created without a client
        let Ok(api) = self.api.as_ref() else {
            return;
        };

        let products: Vec<String> = run.artifacts(PRODUCT).into_iter().map(String::from).collect();
        for id in &products {
            self.cleanup_product(api, run, id).await;
        }

        if self.config.delete_user_on_cleanup {
            let users: Vec<String> = run.artifacts(USER).into_iter().map(String::from).collect();
            for id in &users {
                self.cleanup_user(api, run, id).await;
            }
        }
    }
}
