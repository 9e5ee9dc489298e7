// Database access for discounts, targets, redemptions, and the course read
// model the engine consumes

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::auth::models::Role;
use crate::discounts::error::DiscountError;
use crate::discounts::models::{Discount, ScopeKind, TargetSet};
use crate::discounts::query::DiscountQueryBuilder;
use crate::discounts::weakness::CourseSignals;
use crate::models::Course;

const DISCOUNT_COLUMNS: &str = "id, name, description, code, is_hidden, created_by, \
    creator_role, scope, percent_value, fixed_value, usage_limit, per_user_limit, \
    starts_at, ends_at, usage_count, is_active, created_at, updated_at";

/// Field values for a new discount row
#[derive(Debug, Clone)]
pub struct NewDiscount {
    pub name: String,
    pub description: Option<String>,
    pub code: String,
    pub is_hidden: bool,
    pub created_by: i32,
    pub creator_role: Role,
    pub scope: ScopeKind,
    pub percent_value: Option<i32>,
    pub fixed_value: Option<Decimal>,
    pub usage_limit: Option<i32>,
    pub per_user_limit: Option<i32>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

/// One redeemed line: (course_id, amount_discounted, final_price)
pub type RedemptionLine = (i32, Decimal, Decimal);

/// Repository for discount rows and their owned target/redemption records
#[derive(Clone)]
pub struct DiscountRepository {
    pool: PgPool,
}

impl DiscountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a discount and its target rows in one transaction
    pub async fn create(
        &self,
        new: &NewDiscount,
        targets: &TargetSet,
    ) -> Result<Discount, DiscountError> {
        let mut tx = self.pool.begin().await?;

        let discount = sqlx::query_as::<_, Discount>(&format!(
            r#"
            INSERT INTO discounts (
                name, description, code, is_hidden, created_by, creator_role, scope,
                percent_value, fixed_value, usage_limit, per_user_limit, starts_at, ends_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {}
            "#,
            DISCOUNT_COLUMNS
        ))
        .bind(&new.name)
        .bind(&new.description)
        .bind(&new.code)
        .bind(new.is_hidden)
        .bind(new.created_by)
        .bind(new.creator_role)
        .bind(new.scope)
        .bind(new.percent_value)
        .bind(new.fixed_value)
        .bind(new.usage_limit)
        .bind(new.per_user_limit)
        .bind(new.starts_at)
        .bind(new.ends_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| Self::map_unique_violation(e, &new.code))?;

        Self::insert_targets(&mut tx, discount.id, targets).await?;

        tx.commit().await?;

        Ok(discount)
    }

    /// Rewrite a discount row and replace its target rows wholesale
    ///
    /// The prior Target rows are deleted and the new set inserted in the
    /// same transaction; there is no diff/merge.
    pub async fn update(
        &self,
        discount: &Discount,
        targets: &TargetSet,
    ) -> Result<Discount, DiscountError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, Discount>(&format!(
            r#"
            UPDATE discounts
            SET name = $1,
                description = $2,
                code = $3,
                is_hidden = $4,
                scope = $5,
                percent_value = $6,
                fixed_value = $7,
                usage_limit = $8,
                per_user_limit = $9,
                starts_at = $10,
                ends_at = $11,
                is_active = $12,
                updated_at = NOW()
            WHERE id = $13
            RETURNING {}
            "#,
            DISCOUNT_COLUMNS
        ))
        .bind(&discount.name)
        .bind(&discount.description)
        .bind(&discount.code)
        .bind(discount.is_hidden)
        .bind(discount.scope)
        .bind(discount.percent_value)
        .bind(discount.fixed_value)
        .bind(discount.usage_limit)
        .bind(discount.per_user_limit)
        .bind(discount.starts_at)
        .bind(discount.ends_at)
        .bind(discount.is_active)
        .bind(discount.id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| Self::map_unique_violation(e, &discount.code))?
        .ok_or(DiscountError::NotFound)?;

        sqlx::query("DELETE FROM discount_targets WHERE discount_id = $1")
            .bind(discount.id)
            .execute(&mut *tx)
            .await?;

        Self::insert_targets(&mut tx, discount.id, targets).await?;

        tx.commit().await?;

        Ok(updated)
    }

    async fn insert_targets(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        discount_id: i32,
        targets: &TargetSet,
    ) -> Result<(), DiscountError> {
        for course_id in &targets.course_ids {
            sqlx::query("INSERT INTO discount_targets (discount_id, course_id) VALUES ($1, $2)")
                .bind(discount_id)
                .bind(course_id)
                .execute(&mut **tx)
                .await?;
        }
        for category_id in &targets.category_ids {
            sqlx::query("INSERT INTO discount_targets (discount_id, category_id) VALUES ($1, $2)")
                .bind(discount_id)
                .bind(category_id)
                .execute(&mut **tx)
                .await?;
        }
        Ok(())
    }

    fn map_unique_violation(e: sqlx::Error, code: &str) -> DiscountError {
        match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                DiscountError::DuplicateCode(code.to_string())
            }
            _ => DiscountError::DatabaseError(e.to_string()),
        }
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Discount>, DiscountError> {
        let discount = sqlx::query_as::<_, Discount>(&format!(
            "SELECT {} FROM discounts WHERE id = $1",
            DISCOUNT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(discount)
    }

    /// Case-insensitive code lookup
    pub async fn find_by_code(&self, code: &str) -> Result<Option<Discount>, DiscountError> {
        let discount = sqlx::query_as::<_, Discount>(&format!(
            "SELECT {} FROM discounts WHERE UPPER(code) = UPPER($1)",
            DISCOUNT_COLUMNS
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(discount)
    }

    /// Whether a code is taken (case-insensitive), optionally ignoring one row
    pub async fn code_exists(
        &self,
        code: &str,
        exclude_id: Option<i32>,
    ) -> Result<bool, DiscountError> {
        let exists: Option<bool> = match exclude_id {
            Some(id) => {
                sqlx::query_scalar(
                    "SELECT EXISTS(SELECT 1 FROM discounts WHERE UPPER(code) = UPPER($1) AND id != $2)",
                )
                .bind(code)
                .bind(id)
                .fetch_one(&self.pool)
                .await?
            }
            None => {
                sqlx::query_scalar(
                    "SELECT EXISTS(SELECT 1 FROM discounts WHERE UPPER(code) = UPPER($1))",
                )
                .bind(code)
                .fetch_one(&self.pool)
                .await?
            }
        };

        Ok(exists.unwrap_or(false))
    }

    /// Run a built listing query, returning the page and the total count
    pub async fn list(
        &self,
        builder: &DiscountQueryBuilder,
    ) -> Result<(Vec<Discount>, i64), DiscountError> {
        let (sql, params) = builder.build();
        let mut query = sqlx::query_as::<_, Discount>(&sql);
        for param in &params {
            query = query.bind(param);
        }
        let discounts = query.fetch_all(&self.pool).await?;

        let (count_sql, count_params) = builder.build_count();
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        for param in &count_params {
            count_query = count_query.bind(param);
        }
        let total = count_query.fetch_one(&self.pool).await?;

        Ok((discounts, total))
    }

    /// All active, non-hidden discounts in ascending id order
    ///
    /// The id ordering is the documented tie-break for availability ranking.
    pub async fn list_active_visible(&self) -> Result<Vec<Discount>, DiscountError> {
        let discounts = sqlx::query_as::<_, Discount>(&format!(
            "SELECT {} FROM discounts WHERE is_active = TRUE AND is_hidden = FALSE ORDER BY id",
            DISCOUNT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(discounts)
    }

    /// Load a discount's target rows into their in-memory form
    pub async fn load_targets(&self, discount_id: i32) -> Result<TargetSet, DiscountError> {
        let rows: Vec<(Option<i32>, Option<i32>)> = sqlx::query_as(
            "SELECT course_id, category_id FROM discount_targets WHERE discount_id = $1 ORDER BY id",
        )
        .bind(discount_id)
        .fetch_all(&self.pool)
        .await?;

        let mut targets = TargetSet::default();
        for (course_id, category_id) in rows {
            if let Some(course_id) = course_id {
                targets.course_ids.push(course_id);
            } else if let Some(category_id) = category_id {
                targets.category_ids.push(category_id);
            }
        }

        Ok(targets)
    }

    /// Load target rows for many discounts at once
    pub async fn load_targets_many(
        &self,
        discount_ids: &[i32],
    ) -> Result<HashMap<i32, TargetSet>, DiscountError> {
        let rows: Vec<(i32, Option<i32>, Option<i32>)> = sqlx::query_as(
            "SELECT discount_id, course_id, category_id FROM discount_targets \
             WHERE discount_id = ANY($1) ORDER BY id",
        )
        .bind(discount_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut map: HashMap<i32, TargetSet> = HashMap::new();
        for (discount_id, course_id, category_id) in rows {
            let entry = map.entry(discount_id).or_default();
            if let Some(course_id) = course_id {
                entry.course_ids.push(course_id);
            } else if let Some(category_id) = category_id {
                entry.category_ids.push(category_id);
            }
        }

        Ok(map)
    }

    /// Set or flip the active flag
    pub async fn set_active(&self, id: i32, active: bool) -> Result<Discount, DiscountError> {
        let discount = sqlx::query_as::<_, Discount>(&format!(
            "UPDATE discounts SET is_active = $1, updated_at = NOW() WHERE id = $2 RETURNING {}",
            DISCOUNT_COLUMNS
        ))
        .bind(active)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DiscountError::NotFound)?;

        Ok(discount)
    }

    /// Delete a discount and its target rows in one transaction
    pub async fn delete(&self, id: i32) -> Result<(), DiscountError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM discount_targets WHERE discount_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM discounts WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DiscountError::NotFound);
        }

        tx.commit().await?;

        Ok(())
    }

    /// Total redemption rows recorded against a discount
    pub async fn redemption_count(&self, discount_id: i32) -> Result<i64, DiscountError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM discount_redemptions WHERE discount_id = $1")
                .bind(discount_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// Distinct purchase transactions by one user against a discount
    ///
    /// Transaction-scoped: a purchase covering many courses counts once.
    pub async fn user_transaction_count(
        &self,
        discount_id: i32,
        user_id: i32,
    ) -> Result<i64, DiscountError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(DISTINCT purchase_id) FROM discount_redemptions \
             WHERE discount_id = $1 AND user_id = $2",
        )
        .bind(discount_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Record one purchase's redemption of a discount
    ///
    /// The usage counter is bumped with a conditional update inside the
    /// transaction, so the ceiling holds under concurrent redemption: if the
    /// guard matches no row the transaction rolls back with
    /// `UsageExhausted` and no redemption lines are written.
    pub async fn record_redemption(
        &self,
        discount_id: i32,
        purchase_id: Uuid,
        user_id: i32,
        lines: &[RedemptionLine],
    ) -> Result<(), DiscountError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE discounts
            SET usage_count = usage_count + 1, updated_at = NOW()
            WHERE id = $1 AND (usage_limit IS NULL OR usage_count < usage_limit)
            "#,
        )
        .bind(discount_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            // Either the discount vanished or the ceiling was hit; check which
            let exists: Option<bool> =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM discounts WHERE id = $1)")
                    .bind(discount_id)
                    .fetch_one(&mut *tx)
                    .await?;
            return if exists.unwrap_or(false) {
                Err(DiscountError::UsageExhausted)
            } else {
                Err(DiscountError::NotFound)
            };
        }

        for (course_id, amount_discounted, final_price) in lines {
            sqlx::query(
                r#"
                INSERT INTO discount_redemptions
                    (discount_id, purchase_id, user_id, course_id, amount_discounted, final_price)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(discount_id)
            .bind(purchase_id)
            .bind(user_id)
            .bind(course_id)
            .bind(amount_discounted)
            .bind(final_price)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }
}

/// Read-model queries over the course catalog used by the discount engine
#[derive(Clone)]
pub struct CourseCatalogRepository {
    pool: PgPool,
}

impl CourseCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_ids(&self, ids: &[i32]) -> Result<Vec<Course>, DiscountError> {
        let courses = sqlx::query_as::<_, Course>(
            "SELECT id, title, description, category_id, lecturer_id, price, rating_avg, \
             view_count, enrollment_count, is_published, created_at \
             FROM courses WHERE id = ANY($1) ORDER BY id",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(courses)
    }

    /// Ids of every course a lecturer owns, ascending
    pub async fn ids_owned_by(&self, lecturer_id: i32) -> Result<Vec<i32>, DiscountError> {
        let ids: Vec<i32> =
            sqlx::query_scalar("SELECT id FROM courses WHERE lecturer_id = $1 ORDER BY id")
                .bind(lecturer_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(ids)
    }

    /// Which of the given category ids actually exist
    pub async fn existing_category_ids(&self, ids: &[i32]) -> Result<Vec<i32>, DiscountError> {
        let existing: Vec<i32> =
            sqlx::query_scalar("SELECT id FROM categories WHERE id = ANY($1) ORDER BY id")
                .bind(ids)
                .fetch_all(&self.pool)
                .await?;

        Ok(existing)
    }

    /// Signals for the weak-course ranking, ascending course id
    ///
    /// Revenue is the sum of discounted sale prices recorded against each
    /// course; courses without redemptions read as zero revenue.
    pub async fn weak_course_signals(&self) -> Result<Vec<CourseSignals>, DiscountError> {
        let rows: Vec<(i32, f64, i64, i64, Decimal)> = sqlx::query_as(
            r#"
            SELECT c.id, c.rating_avg, c.enrollment_count, c.view_count,
                   COALESCE(r.revenue, 0) AS revenue
            FROM courses c
            LEFT JOIN (
                SELECT course_id, SUM(final_price) AS revenue
                FROM discount_redemptions
                GROUP BY course_id
            ) r ON r.course_id = c.id
            ORDER BY c.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(course_id, rating_avg, enrollment_count, view_count, revenue)| CourseSignals {
                    course_id,
                    rating_avg,
                    enrollment_count,
                    view_count,
                    revenue,
                },
            )
            .collect())
    }
}
