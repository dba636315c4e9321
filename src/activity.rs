use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, ConnectionTrait, Set};
use uuid::Uuid;

use crate::{entity::activity_logs::ActiveModel as ActivityActive, error::AppResult};

/// One ActivityLog row waiting to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewActivity {
    pub kind: &'static str,
    pub message: String,
    pub user_id: Option<Uuid>,
}

impl NewActivity {
    pub fn new(kind: &'static str, message: impl Into<String>, user_id: Option<Uuid>) -> Self {
        Self {
            kind,
            message: message.into(),
            user_id,
        }
    }
}

pub async fn log_activity<C>(conn: &C, activity: &NewActivity) -> AppResult<()>
where
    C: ConnectionTrait,
{
    ActivityActive {
        id: Set(Uuid::new_v4()),
        kind: Set(activity.kind.to_string()),
        message: Set(activity.message.clone()),
        user_id: Set(activity.user_id),
        created_at: NotSet,
    }
    .insert(conn)
    .await?;

    Ok(())
}
