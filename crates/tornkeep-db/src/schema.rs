//! Schema Manager: forward-only migrations tracked in `schema_version`.

use sqlx::SqlitePool;

use crate::clock::Clock;
use crate::error::MigrationError;
use crate::migrations::{CREATE_SCHEMA_VERSION, MIGRATIONS, Migration};
use crate::sqlite::begin_write;

/// Applies [`Migration`]s in ascending order, one transaction each.
pub struct SchemaManager<'a> {
    pool: &'a SqlitePool,
    clock: &'a dyn Clock,
    migrations: &'a [Migration],
}

impl<'a> SchemaManager<'a> {
    /// Manager over the migrations shipped with this build.
    pub fn new(pool: &'a SqlitePool, clock: &'a dyn Clock) -> Self {
        Self::with_migrations(pool, clock, MIGRATIONS)
    }

    /// Manager over an explicit migration list. Versions need not be dense;
    /// gaps are reported when a migration would have to cross them.
    pub const fn with_migrations(
        pool: &'a SqlitePool,
        clock: &'a dyn Clock,
        migrations: &'a [Migration],
    ) -> Self {
        Self {
            pool,
            clock,
            migrations,
        }
    }

    /// Highest version this manager knows.
    pub fn latest_version(&self) -> i64 {
        self.migrations.iter().map(|m| m.version).max().unwrap_or(0)
    }

    /// The stored schema version, `0` for a fresh file.
    ///
    /// Creates the version table if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::Database`] if the version table cannot be
    /// created or read.
    pub async fn current_version(&self) -> Result<i64, MigrationError> {
        sqlx::query(CREATE_SCHEMA_VERSION).execute(self.pool).await?;
        let version: i64 =
            sqlx::query_scalar("SELECT COALESCE(MAX(version), 0) FROM schema_version")
                .fetch_one(self.pool)
                .await?;
        Ok(version)
    }

    /// Bring the schema to exactly `target`.
    ///
    /// Every version between the stored one and `target` must have a
    /// migration; nothing is applied if one is missing. Each migration runs
    /// in its own transaction, so a failure leaves the schema at the last
    /// fully applied version. Returns how many migrations were applied.
    ///
    /// # Errors
    ///
    /// - [`MigrationError::Downgrade`] if `target` is below the stored version
    /// - [`MigrationError::UnknownTarget`] if `target` is beyond the latest
    ///   known migration
    /// - [`MigrationError::Gap`] if a version in between has no migration
    /// - [`MigrationError::Failed`] if a migration's statements fail
    pub async fn migrate_to(&self, target: i64) -> Result<usize, MigrationError> {
        let current = self.current_version().await?;
        if target == current {
            tracing::debug!(version = current, "Schema already at target version");
            return Ok(0);
        }
        if target < current {
            return Err(MigrationError::Downgrade { current, target });
        }
        let latest = self.latest_version();
        if target > latest {
            return Err(MigrationError::UnknownTarget { target, latest });
        }

        // Resolve the whole chain before touching the file.
        let mut plan = Vec::new();
        let mut version = current;
        while version < target {
            version = version.saturating_add(1);
            let migration = self
                .migrations
                .iter()
                .find(|m| m.version == version)
                .ok_or(MigrationError::Gap { missing: version })?;
            plan.push(migration);
        }

        for migration in &plan {
            self.apply(migration).await?;
        }
        Ok(plan.len())
    }

    /// Bring the schema to the latest known version.
    ///
    /// # Errors
    ///
    /// See [`SchemaManager::migrate_to`].
    pub async fn migrate_latest(&self) -> Result<usize, MigrationError> {
        self.migrate_to(self.latest_version()).await
    }

    async fn apply(&self, migration: &Migration) -> Result<(), MigrationError> {
        let failed = |source| MigrationError::Failed {
            version: migration.version,
            source,
        };

        let mut tx = begin_write(self.pool).await.map_err(failed)?;
        for statement in migration.statements {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .map_err(failed)?;
        }
        sqlx::query("INSERT INTO schema_version (version, description, applied_at) VALUES (?, ?, ?)")
            .bind(migration.version)
            .bind(migration.description)
            .bind(self.clock.now().timestamp())
            .execute(&mut *tx)
            .await
            .map_err(failed)?;
        tx.commit().await.map_err(failed)?;

        tracing::info!(
            version = migration.version,
            description = migration.description,
            "Applied schema migration"
        );
        Ok(())
    }
}
