//! Host accounts: registration, login check and cascading deletion.

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::{
    dao::models::{HostEntity, SessionEntity, Stamp},
    dto::{
        host::{HostCredentials, HostSummary, ValidationResponse},
        sheets::DeleteResponse,
    },
    error::ServiceError,
    services::{input::clean_name, session_service},
    state::SharedState,
};

/// Salted digest stored in the `password` column.
pub fn hash_password(username: &str, password: &str) -> String {
    let digest = Sha256::new()
        .chain_update(username.as_bytes())
        .chain_update(b":")
        .chain_update(password.as_bytes())
        .finalize();
    format!("{digest:x}")
}

fn is_digest(value: &str) -> bool {
    value.len() == 64 && value.bytes().all(|b| b.is_ascii_hexdigit())
}

pub async fn create_host(
    state: &SharedState,
    payload: HostCredentials,
) -> Result<HostSummary, ServiceError> {
    let username = clean_name(&payload.username, state.config().max_name_length, "username")?;
    let password = payload.password;

    state
        .run_write(move |repository| async move {
            if repository
                .find::<HostEntity, _>(|host| host.username == username)
                .await?
                .is_some()
            {
                return Err(ServiceError::Conflict("Username already exists".into()));
            }

            let host = HostEntity {
                password: hash_password(&username, &password),
                username,
                created_at: Stamp::now().rfc3339,
            };
            repository.insert(&host).await?;
            info!(username = %host.username, "host registered");
            Ok(host.into())
        })
        .await
}

/// Check a host's credentials. Rows written before passwords were hashed hold the
/// plain password; a successful login rewrites them as a digest.
pub async fn validate_host(
    state: &SharedState,
    payload: HostCredentials,
) -> Result<ValidationResponse, ServiceError> {
    let username = payload.username.trim().to_string();
    let repository = state.repository().await?;
    let Some(found) = repository
        .find::<HostEntity, _>(|host| host.username == username)
        .await?
    else {
        return Ok(ValidationResponse { is_valid: false });
    };

    let digest = hash_password(&username, &payload.password);
    if found.entity.password == digest {
        return Ok(ValidationResponse { is_valid: true });
    }

    let legacy = !is_digest(&found.entity.password) && found.entity.password == payload.password;
    if legacy {
        debug!(%username, "upgrading plain-text host password");
        state
            .run_write(move |repository| async move {
                // Re-read: the row may have moved since the lookup.
                if let Some(current) = repository
                    .find::<HostEntity, _>(|host| host.username == username)
                    .await?
                {
                    repository
                        .set_cell::<HostEntity>(current.row, "password", digest)
                        .await?;
                }
                Ok(())
            })
            .await?;
    }
    Ok(ValidationResponse { is_valid: legacy })
}

/// Delete a host together with every session it owns.
pub async fn delete_host(state: &SharedState, username: &str) -> Result<DeleteResponse, ServiceError> {
    let username = username.trim().to_string();
    state
        .run_write(move |repository| async move {
            if repository
                .find::<HostEntity, _>(|host| host.username == username)
                .await?
                .is_none()
            {
                return Err(ServiceError::NotFound(format!("host `{username}` not found")));
            }

            let sessions = repository
                .list_where::<SessionEntity, _>(|session| session.host_username == username)
                .await?;
            let mut deleted = 0;
            for session in &sessions {
                deleted += session_service::purge_session(&repository, &session.session_id).await?;
            }
            deleted += repository
                .delete_where::<HostEntity, _>(|host| host.username == username)
                .await?;

            info!(%username, sessions = sessions.len(), deleted, "host deleted");
            Ok(DeleteResponse::new(deleted))
        })
        .await
}
