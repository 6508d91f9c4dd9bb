//! # Notification Repository
//!
//! School notices. A user sees a notification when its audience is one of
//! [`Audience::visible_to`] for their role, or when it is addressed to them.
//! Read state is per user (`notification_reads`).

use sqlx::PgPool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::new_id;
use shikkha_core::{Audience, NewNotification, NotificationView, Page, Principal};

const VIEW_COLUMNS: &str = r#"
    n.id, n.school_id, n.title, n.body, n.audience, n.recipient_user_id, n.priority,
    n.created_by, n.created_at, (r.user_id IS NOT NULL) AS is_read
"#;

// $1 school, $2 user, $3 visible audiences
const VISIBLE: &str = r#"
    n.school_id = $1
    AND (n.audience = ANY($3) OR (n.audience = 'user' AND n.recipient_user_id = $2))
"#;

/// Repository for notification database operations.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        NotificationRepository { pool }
    }

    /// Publishes a notification. A single recipient must belong to the school.
    pub async fn create(
        &self,
        school_id: &str,
        new: &NewNotification,
        created_by: Option<&str>,
    ) -> DbResult<NotificationView> {
        new.validate()?;

        if let Some(recipient) = new.recipient_user_id.as_deref() {
            let found: Option<String> =
                sqlx::query_scalar("SELECT id FROM users WHERE id = $1 AND school_id = $2")
                    .bind(recipient)
                    .bind(school_id)
                    .fetch_optional(&self.pool)
                    .await?;
            if found.is_none() {
                return Err(DbError::not_found("User", recipient));
            }
        }

        let notification = sqlx::query_as::<_, NotificationView>(
            r#"
            INSERT INTO notifications (id, school_id, title, body, audience, recipient_user_id, priority, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, school_id, title, body, audience, recipient_user_id, priority,
                      created_by, created_at, FALSE AS is_read
            "#,
        )
        .bind(new_id())
        .bind(school_id)
        .bind(new.title.trim())
        .bind(new.body.trim())
        .bind(new.audience)
        .bind(new.recipient_user_id.as_deref())
        .bind(new.priority)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await?;

        info!(
            school_id = %school_id,
            notification_id = %notification.id,
            audience = new.audience.as_str(),
            "Notification published"
        );
        Ok(notification)
    }

    /// Notifications visible to `principal` in `school_id`, newest first.
    pub async fn list_for(
        &self,
        school_id: &str,
        principal: &Principal,
        unread_only: bool,
        page: Page,
    ) -> DbResult<Vec<NotificationView>> {
        let rows = sqlx::query_as::<_, NotificationView>(&format!(
            r#"
            SELECT {VIEW_COLUMNS}
            FROM notifications n
            LEFT JOIN notification_reads r ON r.notification_id = n.id AND r.user_id = $2
            WHERE {VISIBLE}
              AND (NOT $4 OR r.user_id IS NULL)
            ORDER BY n.created_at DESC, n.id
            LIMIT $5 OFFSET $6
            "#
        ))
        .bind(school_id)
        .bind(&principal.user_id)
        .bind(visible_audiences(principal))
        .bind(unread_only)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn unread_count(&self, school_id: &str, principal: &Principal) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(&format!(
            r#"
            SELECT COUNT(*)
            FROM notifications n
            LEFT JOIN notification_reads r ON r.notification_id = n.id AND r.user_id = $2
            WHERE {VISIBLE} AND r.user_id IS NULL
            "#
        ))
        .bind(school_id)
        .bind(&principal.user_id)
        .bind(visible_audiences(principal))
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Marks a notification read for `principal`. Marking twice is a no-op.
    ///
    /// A notification the user cannot see is reported as not found.
    pub async fn mark_read(&self, school_id: &str, principal: &Principal, id: &str) -> DbResult<()> {
        let visible: Option<String> = sqlx::query_scalar(&format!(
            "SELECT n.id FROM notifications n WHERE {VISIBLE} AND n.id = $4"
        ))
        .bind(school_id)
        .bind(&principal.user_id)
        .bind(visible_audiences(principal))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        if visible.is_none() {
            return Err(DbError::not_found("Notification", id));
        }

        sqlx::query(
            r#"
            INSERT INTO notification_reads (notification_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (notification_id, user_id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(&principal.user_id)
        .execute(&self.pool)
        .await?;

        debug!(notification_id = %id, user_id = %principal.user_id, "Notification marked read");
        Ok(())
    }

    pub async fn delete(&self, school_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM notifications WHERE school_id = $1 AND id = $2")
            .bind(school_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Notification", id));
        }
        info!(school_id = %school_id, notification_id = %id, "Notification deleted");
        Ok(())
    }
}

fn visible_audiences(principal: &Principal) -> Vec<&'static str> {
    Audience::visible_to(principal.role)
        .iter()
        .map(Audience::as_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shikkha_core::Role;

    fn principal(role: Role) -> Principal {
        Principal {
            user_id: "u-1".to_string(),
            role,
            school_id: Some("s-1".to_string()),
        }
    }

    #[test]
    fn test_visible_audiences_by_role() {
        let teacher = principal(Role::Teacher);
        assert_eq!(visible_audiences(&teacher), vec!["all", "teachers"]);

        let admin = principal(Role::Admin);
        let audiences = visible_audiences(&admin);
        assert!(audiences.contains(&"parents"));
        assert!(!audiences.contains(&"user"));
    }
}
