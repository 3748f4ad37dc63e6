//! Profile repository.

use jobtoken_models::{Profile, Role};

use crate::client::StoreClient;
use crate::error::StoreResult;
use crate::query::Query;

const TABLE: &str = "profiles";
const COLUMNS: &str = "id,email,full_name,role";

/// Repository for `profiles` rows.
pub struct ProfileRepository {
    client: StoreClient,
}

impl ProfileRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    /// Get a profile by ID.
    pub async fn get(&self, id: &str) -> StoreResult<Option<Profile>> {
        let query = Query::new().select(COLUMNS).eq("id", id);
        self.client.select_one(TABLE, &query).await
    }

    /// Find a profile by exact email.
    pub async fn find_by_email(&self, email: &str) -> StoreResult<Option<Profile>> {
        let query = Query::new().select(COLUMNS).eq("email", email);
        self.client.select_one(TABLE, &query).await
    }

    /// Number of profiles with the given role.
    pub async fn count_by_role(&self, role: Role) -> StoreResult<u64> {
        let query = Query::new().select("id").eq("role", role);
        self.client.count(TABLE, &query).await
    }

    /// Profiles whose email contains `needle`, case-insensitively.
    pub async fn search_by_email(&self, needle: &str, limit: u32) -> StoreResult<Vec<Profile>> {
        let query = Query::new()
            .select(COLUMNS)
            .ilike_contains("email", needle)
            .limit(limit);
        self.client.select(TABLE, &query).await
    }
}
