/// Database models for BitSleuth
///
/// # Models
///
/// - `user`: User accounts and subscription state
/// - `plan`: Purchasable plan tiers (price + grant duration)
/// - `invoice`: Priced requests for access
/// - `payment`: Claimed on-chain transactions against invoices
/// - `audit`: Append-only audit log
///
/// # Example
///
/// ```no_run
/// use bitsleuth_shared::models::user::{User, CreateUser};
/// use bitsleuth_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let new_user = CreateUser {
///     email: "user@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     is_admin: false,
///     verification_token: None,
/// };
///
/// let user = User::create(&pool, new_user).await?;
/// # Ok(())
/// # }
/// ```

pub mod audit;
pub mod invoice;
pub mod payment;
pub mod plan;
pub mod user;
