//! Browser flow through the AgroRed web UI

use std::fmt;
use std::time::Duration;

use agrored_report::{Scenario, StepFailure, StepResult, TestRun};
use async_trait::async_trait;
use tracing::{info, warn};

use crate::browser::{nth, with_text, BrowserSession, WaitState};
use crate::config::FrontendConfig;
use crate::identity::{random_email, random_product_name};

const PRODUCT_CARD: &str = ".MuiCard-root";
const STAR: &str = r#"span[class*="css-w8gd7d"]"#;
const REVIEW_TEXT: &str = r#"textarea[placeholder*="Comparte tu experiencia"]"#;
const STARS_GIVEN: usize = 5;
const REVIEW_COMMENT: &str = "prueba de comentario";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontendStep {
    OpenFrontend,
    LoadCatalog,
    GoToLogin,
    RegisterUser,
    LogIn,
    SelectExistingProduct,
    RateProduct,
    UpdateRating,
    GoToAddProduct,
    CreateProduct,
    SearchProduct,
    SelectTestProduct,
    EditProduct,
    UpdateDescription,
    DeleteProduct,
    LogOut,
}

impl fmt::Display for FrontendStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FrontendStep::OpenFrontend => "Open frontend",
            FrontendStep::LoadCatalog => "Load catalog",
            FrontendStep::GoToLogin => "Go to login",
            FrontendStep::RegisterUser => "User registration",
            FrontendStep::LogIn => "Log in",
            FrontendStep::SelectExistingProduct => "Select existing product",
            FrontendStep::RateProduct => "Rate product",
            FrontendStep::UpdateRating => "Update rating",
            FrontendStep::GoToAddProduct => "Go to add product",
            FrontendStep::CreateProduct => "Product creation",
            FrontendStep::SearchProduct => "Product search",
            FrontendStep::SelectTestProduct => "Select test product",
            FrontendStep::EditProduct => "Edit product",
            FrontendStep::UpdateDescription => "Update product description",
            FrontendStep::DeleteProduct => "Product deletion",
            FrontendStep::LogOut => "Log out",
        };
        f.write_str(s)
    }
}

/// Product created through the add-product form.
#[derive(Debug, Clone)]
pub struct TestProduct {
    pub name: String,
    pub description: String,
    pub price: u32,
    pub stock: u32,
    pub whatsapp_number: String,
    pub category: String,
}

impl TestProduct {
    pub fn random() -> Self {
        Self {
            name: random_product_name(),
            description: "descripción de prueba".to_string(),
            price: 1000,
            stock: 10,
            whatsapp_number: "0123456789".to_string(),
            category: "Frutas".to_string(),
        }
    }
}

pub struct FrontendScenario {
    config: FrontendConfig,
    session: Option<BrowserSession>,
    email: String,
    product: TestProduct,
}

fn active(session: &mut Option<BrowserSession>) -> Result<&mut BrowserSession, StepFailure> {
    session
        .as_mut()
        .ok_or_else(|| StepFailure::Browser("browser session is not open".to_string()))
}

impl FrontendScenario {
    pub fn new(config: FrontendConfig) -> Self {
        Self {
            config,
            session: None,
            email: random_email(),
            product: TestProduct::random(),
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn product(&self) -> &TestProduct {
        &self.product
    }

    async fn settle(&self) {
        if self.config.settle_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.settle_ms)).await;
        }
    }

    async fn click_nav(&mut self, text: &str) -> StepResult {
        active(&mut self.session)?.click(&with_text("a", text)).await?;
        self.settle().await;
        Ok(())
    }

    async fn open_frontend(&mut self, run: &mut TestRun) -> StepResult {
        let mut session = BrowserSession::launch(&self.config).await?;
        let opened = session.goto(&self.config.base_url).await;
        // keep the session even on a failed navigation so finalize can close it
        self.session = Some(session);
        opened?;
        self.settle().await;

        run.pass(format!("✅ Frontend opened: {}", self.config.base_url));
        Ok(())
    }

    async fn load_catalog(&mut self, run: &mut TestRun) -> StepResult {
        self.click_nav("Catálogo").await?;

        let session = active(&mut self.session)?;
        session.wait_for(PRODUCT_CARD, WaitState::Attached).await?;
        let cards = session.count(PRODUCT_CARD).await?;
        if cards == 0 {
            return Err(StepFailure::assertion("catalog shows no products"));
        }
        let first = session.text(PRODUCT_CARD).await?;
        let first = first.lines().next().unwrap_or_default().trim();

        run.pass(format!(
            "✅ Catalog loaded: {} products shown, first is '{}'.",
            cards, first
        ));
        Ok(())
    }

    async fn register_user(&mut self, run: &mut TestRun) -> StepResult {
        let session = active(&mut self.session)?;
        session.wait_for(".register-form", WaitState::Attached).await?;

        let input = ".register-form .register-input";
        session.fill(&nth(input, 0), &self.email).await?;
        session.fill(&nth(input, 1), &self.config.full_name).await?;
        session.fill(&nth(input, 2), &self.config.password).await?;
        session.click(".register-form .register-button").await?;
        self.settle().await;

        run.pass(format!("✅ User registered: {}", self.email));
        Ok(())
    }

    async fn log_in(&mut self, run: &mut TestRun) -> StepResult {
        let session = active(&mut self.session)?;
        session.wait_for(".login-form", WaitState::Attached).await?;

        let input = ".login-form .login-input";
        session.fill(&nth(input, 0), &self.email).await?;
        session.fill(&nth(input, 1), &self.config.password).await?;
        session.click(".login-form .login-button").await?;
        self.settle().await;

        run.pass(format!("✅ Logged in as {}", self.email));
        Ok(())
    }

    async fn select_product(&mut self, name: &str, run: &mut TestRun) -> StepResult {
        let session = active(&mut self.session)?;
        session.wait_for(PRODUCT_CARD, WaitState::Attached).await?;

        let card = with_text(PRODUCT_CARD, name);
        if session.count(&card).await? == 0 {
            return Err(StepFailure::ElementNotFound(format!("product card '{}'", name)));
        }
        session.click(&nth(&format!("{} a", card), 0)).await?;
        self.settle().await;

        run.pass(format!("✅ Product selected: {}", name));
        Ok(())
    }

    async fn rate_product(&mut self, run: &mut TestRun) -> StepResult {
        let session = active(&mut self.session)?;

        let stars = session.count(STAR).await?;
        if (stars as usize) < STARS_GIVEN {
            return Err(StepFailure::ElementNotFound(format!(
                "{} rating stars (found {})",
                STARS_GIVEN, stars
            )));
        }
        for i in 0..STARS_GIVEN {
            session.click(&nth(STAR, i)).await?;
            tokio::time::sleep(Duration::from_millis(200)).await;
        }

        session.fill(REVIEW_TEXT, REVIEW_COMMENT).await?;
        session.click(&with_text("button", "Enviar Calificación")).await?;
        self.settle().await;

        run.pass(format!("✅ Rating submitted: {} stars.", STARS_GIVEN));
        Ok(())
    }

    async fn update_rating(&mut self, run: &mut TestRun) -> StepResult {
        let session = active(&mut self.session)?;
        session.clear(REVIEW_TEXT).await?;
        session.click(&with_text("button", "Actualizar Calificación")).await?;
        self.settle().await;

        run.pass("✅ Rating updated.");
        Ok(())
    }

    async fn create_product(&mut self, run: &mut TestRun) -> StepResult {
        let session = active(&mut self.session)?;
        session.wait_for(".add-product-form", WaitState::Attached).await?;

        let product = &self.product;
        let fields = [
            ("name", product.name.clone()),
            ("description", product.description.clone()),
            ("price", product.price.to_string()),
            ("stock", product.stock.to_string()),
            ("whatsapp_number", product.whatsapp_number.clone()),
            ("category", product.category.clone()),
        ];
        for (field, value) in &fields {
            session
                .fill(&format!(r#".add-product-form [name="{}"]"#, field), value)
                .await?;
        }
        session.click(".add-product-form .add-product-submit-button").await?;
        self.settle().await;

        run.pass(format!("✅ Product created: {}", self.product.name));
        Ok(())
    }

    async fn search_product(&mut self, run: &mut TestRun) -> StepResult {
        let session = active(&mut self.session)?;
        session.wait_for(".catalog-search-input", WaitState::Visible).await?;
        session.fill(".catalog-search-input input", &self.product.name).await?;
        self.settle().await;

        run.pass(format!("✅ Product searched: {}", self.product.name));
        Ok(())
    }

    async fn edit_product(&mut self, run: &mut TestRun) -> StepResult {
        active(&mut self.session)?
            .click(r#"a[href*="/products/edit"]"#)
            .await?;
        self.settle().await;

        run.pass("✅ Navigated to the product edit page.");
        Ok(())
    }

    async fn update_description(&mut self, run: &mut TestRun) -> StepResult {
        let session = active(&mut self.session)?;
        session.clear(r#"[name="description"]"#).await?;
        session.click(&with_text("button", "Guardar Cambios")).await?;
        self.settle().await;

        run.pass("✅ Product description updated.");
        Ok(())
    }

    async fn delete_product(&mut self, run: &mut TestRun) -> StepResult {
        active(&mut self.session)?
            .click(&with_text("button", "Eliminar"))
            .await?;
        self.settle().await;

        run.pass(format!("✅ Product deleted: {}", self.product.name));
        Ok(())
    }

    async fn log_out(&mut self, run: &mut TestRun) -> StepResult {
        active(&mut self.session)?
            .click(&with_text("button", "Cerrar Sesión"))
            .await?;
        self.settle().await;

        run.pass("✅ Logged out.");
        Ok(())
    }
}

#[async_trait]
impl Scenario for FrontendScenario {
    type Step = FrontendStep;

    fn name(&self) -> &str {
        "frontend"
    }

    fn plan(&self) -> Vec<FrontendStep> {
        use FrontendStep::*;
        vec![
            OpenFrontend,
            LoadCatalog,
            GoToLogin,
            RegisterUser,
            LogIn,
            LoadCatalog,
            SelectExistingProduct,
            RateProduct,
            UpdateRating,
            GoToAddProduct,
            CreateProduct,
            LoadCatalog,
            SearchProduct,
            SelectTestProduct,
            EditProduct,
            UpdateDescription,
            LoadCatalog,
            SearchProduct,
            SelectTestProduct,
            DeleteProduct,
            LoadCatalog,
            SearchProduct,
            LogOut,
        ]
    }

    async fn execute(&mut self, step: FrontendStep, run: &mut TestRun) -> StepResult {
        match step {
            FrontendStep::OpenFrontend => self.open_frontend(run).await,
            FrontendStep::LoadCatalog => self.load_catalog(run).await,
            FrontendStep::GoToLogin => self.click_nav("Iniciar Sesión").await,
            FrontendStep::RegisterUser => self.register_user(run).await,
            FrontendStep::LogIn => self.log_in(run).await,
            FrontendStep::SelectExistingProduct => {
                let name = self.config.existing_product.clone();
                self.select_product(&name, run).await
            }
            FrontendStep::RateProduct => self.rate_product(run).await,
            FrontendStep::UpdateRating => self.update_rating(run).await,
            FrontendStep::GoToAddProduct => self.click_nav("Añadir Producto").await,
            FrontendStep::CreateProduct => self.create_product(run).await,
            FrontendStep::SearchProduct => self.search_product(run).await,
            FrontendStep::SelectTestProduct => {
                let name = self.product.name.clone();
                self.select_product(&name, run).await
            }
            FrontendStep::EditProduct => self.edit_product(run).await,
            FrontendStep::UpdateDescription => self.update_description(run).await,
            FrontendStep::DeleteProduct => self.delete_product(run).await,
            FrontendStep::LogOut => self.log_out(run).await,
        }
    }

    async fn finalize(&mut self, run: &mut TestRun) {
        let Some(session) = self.session.take() else {
            info!("No browser session to close");
            return;
        };

        match session.close().await {
            Ok(()) => info!("Browser session closed"),
            Err(e) => {
                warn!("Browser did not close cleanly: {}", e);
                run.info(format!("⚠️ Browser did not close cleanly: {}", e));
            }
        }
    }
}
