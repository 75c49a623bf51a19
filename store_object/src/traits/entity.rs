use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

/// A record stored one-per-document in a collection.
///
/// The repository assigns `id` on create and stamps `createdAt`/`updatedAt`
/// on every write, so entity types usually declare those fields too:
///
/// ```ignore
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// #[serde(rename_all = "camelCase")]
/// struct Deck {
///     id: String,
///     name: String,
///     created_at: String,
///     updated_at: String,
/// }
///
/// impl Entity for Deck {
///     fn id(&self) -> &str {
///         &self.id
///     }
/// }
/// ```
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + Debug {
    fn id(&self) -> &str;
}
