use mongodb::bson::{doc, Document};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, Database, IndexModel};
use std::error::Error;
use std::time::Duration;

pub const USERS: &str = "users";
pub const TESTS: &str = "tests";
pub const BANNERS: &str = "banners";
pub const BOOKINGS: &str = "bookings";
pub const HEALTH_RECOMMENDATIONS: &str = "healthRecommendations";
pub const NEWS: &str = "news";

/// Process-wide MongoDB handle. Cloning is cheap (the driver client is pooled).
#[derive(Clone)]
pub struct MongoDB {
    db: Database,
}

impl MongoDB {
    pub async fn new(uri: &str, db_name: &str) -> Result<Self, Box<dyn Error>> {
        let mut client_options = mongodb::options::ClientOptions::parse(uri).await?;

        client_options.app_name = Some("diagnostic-service".to_string());
        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(2);
        client_options.max_idle_time = Some(Duration::from_secs(300));

        client_options.connect_timeout = Some(Duration::from_secs(5));
        client_options.server_selection_timeout = Some(Duration::from_secs(5));

        let client = Client::with_options(client_options)?;
        let db = client.database(db_name);

        // Fail fast if the deployment is unreachable
        db.run_command(doc! { "ping": 1 }).await?;

        let mongodb = Self { db };
        mongodb.ensure_indexes().await?;

        Ok(mongodb)
    }

    async fn ensure_indexes(&self) -> Result<(), Box<dyn Error>> {
        log::info!("🔧 Creating database indexes...");

        let unique_email = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        match self.documents(USERS).create_index(unique_email).await {
            Ok(_) => log::info!("   ✅ Index ready: users(email, unique)"),
            // Existing duplicates in legacy data must not keep the service down
            Err(e) => log::warn!("   ⚠️  users(email) unique index not created: {}", e),
        }

        let bookings = self.documents(BOOKINGS);
        for keys in [doc! { "patientInfo.email": 1 }, doc! { "report": 1 }] {
            let label = keys.keys().cloned().collect::<Vec<_>>().join(",");
            let index = IndexModel::builder().keys(keys).build();
            match bookings.create_index(index).await {
                Ok(_) => log::info!("   ✅ Index ready: bookings({})", label),
                Err(e) => log::debug!("   ℹ️  Index bookings({}) skipped: {}", label, e),
            }
        }

        log::info!("✅ Database indexes ready");
        Ok(())
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }

    /// Schema-free view of a collection
    pub fn documents(&self, name: &str) -> Collection<Document> {
        self.db.collection(name)
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub async fn health_check(&self) -> bool {
        self.db.run_command(doc! { "ping": 1 }).await.is_ok()
    }
}
