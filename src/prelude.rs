pub use std::{
  collections::{HashMap, HashSet},
  sync::Arc,
  time::Duration,
};

pub use chrono::{NaiveDateTime as DateTime, TimeDelta, Utc};
pub use dashmap::DashMap;
pub use sea_orm::{
  ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection,
  EntityTrait, NotSet, QueryFilter, QueryOrder, QuerySelect, Set,
  TransactionTrait,
};
pub use migration::MigratorTrait;
pub use tracing::{debug, error, info, trace, warn};

pub use crate::error::{Claim, Error, Result};
