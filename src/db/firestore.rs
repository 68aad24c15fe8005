// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users and their session refresh tokens
//! - Playlists and videos (with denormalized counters)
//! - Calendar event mirrors
//! - Notes
//!
//! Multi-document mutations are committed in a single transaction. Counter
//! and order changes use server-side increment transforms so concurrent
//! edits on the same playlist never lose an update. Writes whose effect
//! depends on a document's current state read it through `run_transaction`,
//! which retries on contention.

use crate::db::{collections, sort_by_timestamp, tokens_match, Store};
use crate::error::AppError;
use crate::models::{
    CounterDelta, Event, Note, NotePatch, Playlist, SessionEntry, User, Video, VideoPatch,
};
use async_trait::async_trait;
use firestore::errors::FirestoreError;
use firestore::{FirestoreQueryDirection, FirestoreWritePrecondition};
use futures_util::FutureExt;

// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: firestore::FirestoreDb,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self { client })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self { client })
    }

    // ─── Helper Methods ────────────────────────────────────────────

    async fn get_doc<T>(&self, collection: &str, doc_id: &str) -> Result<Option<T>, AppError>
    where
        T: for<'de> serde::Deserialize<'de> + Send,
    {
        self.client
            .fluent()
            .select()
            .by_id_in(collection)
            .obj()
            .one(doc_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn set_doc<T>(&self, collection: &str, doc_id: &str, object: &T) -> Result<(), AppError>
    where
        T: serde::Serialize + for<'de> serde::Deserialize<'de> + Send + Sync,
    {
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collection)
            .document_id(doc_id)
            .object(object)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn delete_doc(&self, collection: &str, doc_id: &str) -> Result<(), AppError> {
        self.client
            .fluent()
            .delete()
            .from(collection)
            .document_id(doc_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Load a session entry, but only if it belongs to `user_id` and holds
    /// exactly `refresh_token`.
    async fn owned_session(
        &self,
        user_id: &str,
        refresh_token: &str,
    ) -> Result<Option<String>, AppError> {
        let doc_id = SessionEntry::document_id(refresh_token);
        let entry: Option<SessionEntry> = self.get_doc(collections::SESSIONS, &doc_id).await?;
        Ok(entry
            .filter(|e| e.user_id == user_id && tokens_match(&e.refresh_token, refresh_token))
            .map(|_| doc_id))
    }

    /// Helper to batch delete documents using transactions.
    async fn batch_delete<T, F>(
        &self,
        items: &[T],
        collection: &str,
        id_extractor: F,
    ) -> Result<(), AppError>
    where
        F: Fn(&T) -> String,
    {
        for chunk in items.chunks(BATCH_SIZE) {
            let mut transaction = self
                .client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for item in chunk {
                let doc_id = id_extractor(item);
                self.client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(&doc_id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add deletion to transaction for {}: {}",
                            collection, e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit batch deletion: {}", e))
            })?;
        }

        Ok(())
    }
}

/// Add a counter adjustment on a playlist to `transaction`.
fn add_counter_transform(
    client: &firestore::FirestoreDb,
    transaction: &mut firestore::FirestoreTransaction<'_>,
    playlist_id: &str,
    delta: CounterDelta,
) -> Result<(), FirestoreError> {
    if delta.is_zero() {
        return Ok(());
    }

    let builder = client
        .fluent()
        .update()
        .in_col(collections::PLAYLISTS)
        .document_id(playlist_id);

    let builder = match (delta.total, delta.completed) {
        (0, completed) => {
            builder.transforms(|t| t.fields([t.field("completed_videos").increment(completed)]))
        }
        (total, 0) => builder.transforms(|t| t.fields([t.field("total_videos").increment(total)])),
        (total, completed) => builder.transforms(|t| {
            t.fields([
                t.field("total_videos").increment(total),
                t.field("completed_videos").increment(completed),
            ])
        }),
    };

    builder.only_transform().add_to_transaction(transaction)?;
    Ok(())
}

/// Move a video one slot towards the front of its playlist.
///
/// The precondition keeps a shift from recreating a video that a concurrent
/// delete already removed.
fn add_order_shift(
    client: &firestore::FirestoreDb,
    transaction: &mut firestore::FirestoreTransaction<'_>,
    video_id: &str,
) -> Result<(), FirestoreError> {
    client
        .fluent()
        .update()
        .in_col(collections::VIDEOS)
        .precondition(FirestoreWritePrecondition::Exists(true))
        .document_id(video_id)
        .transforms(|t| t.fields([t.field("order").increment(-1)]))
        .only_transform()
        .add_to_transaction(transaction)?;
    Ok(())
}

#[async_trait]
impl Store for FirestoreDb {
    // ─── User Operations ─────────────────────────────────────────

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.get_doc(collections::USERS, user_id).await
    }

    async fn create_user(&self, user: &User, session: &SessionEntry) -> Result<bool, AppError> {
        let mut transaction = self
            .client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        self.client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .precondition(FirestoreWritePrecondition::Exists(false))
            .document_id(&user.id)
            .object(user)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(format!("Failed to add user to transaction: {}", e)))?;

        self.client
            .fluent()
            .update()
            .in_col(collections::SESSIONS)
            .document_id(SessionEntry::document_id(&session.refresh_token))
            .object(session)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add session to transaction: {}", e))
            })?;

        if let Err(e) = transaction.commit().await {
            // A concurrent first login for the same email wins the precondition.
            if self.get_user(&user.id).await?.is_some() {
                tracing::debug!(user_id = %user.id, "User created concurrently");
                return Ok(false);
            }
            return Err(AppError::Database(format!("Transaction commit failed: {}", e)));
        }

        tracing::info!(user_id = %user.id, "User created");
        Ok(true)
    }

    async fn record_returning_login(
        &self,
        user_id: &str,
        session: &SessionEntry,
        calendar_access: bool,
        google_refresh_token: Option<&str>,
        now: &str,
    ) -> Result<Option<User>, AppError> {
        let Some(mut user) = self.get_user(user_id).await? else {
            return Ok(None);
        };

        user.calendar_access = calendar_access;
        user.updated_at = now.to_string();
        let mut fields = vec!["calendar_access", "updated_at"];
        if let Some(token) = google_refresh_token {
            user.google_refresh_token = token.to_string();
            fields.push("google_refresh_token");
        }

        let mut transaction = self
            .client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        self.client
            .fluent()
            .update()
            .fields(fields)
            .in_col(collections::USERS)
            .precondition(FirestoreWritePrecondition::Exists(true))
            .document_id(user_id)
            .object(&user)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(format!("Failed to add user to transaction: {}", e)))?;

        self.client
            .fluent()
            .update()
            .in_col(collections::SESSIONS)
            .document_id(SessionEntry::document_id(&session.refresh_token))
            .object(session)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add session to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        Ok(Some(user))
    }

    async fn update_profile(
        &self,
        user_id: &str,
        name: &str,
        image: &str,
        now: &str,
    ) -> Result<Option<User>, AppError> {
        let Some(mut user) = self.get_user(user_id).await? else {
            return Ok(None);
        };
        user.name = name.to_string();
        user.image = Some(image.to_string());
        user.updated_at = now.to_string();

        let _: () = self
            .client
            .fluent()
            .update()
            .fields(["name", "image", "updated_at"])
            .in_col(collections::USERS)
            .document_id(user_id)
            .object(&user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(Some(user))
    }

    // ─── Session Operations ──────────────────────────────────────

    async fn session_active(&self, user_id: &str, refresh_token: &str) -> Result<bool, AppError> {
        Ok(self.owned_session(user_id, refresh_token).await?.is_some())
    }

    async fn rotate_session(
        &self,
        user_id: &str,
        old_token: &str,
        new_session: &SessionEntry,
    ) -> Result<bool, AppError> {
        let Some(old_doc_id) = self.owned_session(user_id, old_token).await? else {
            return Ok(false);
        };

        let mut transaction = self
            .client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        // The precondition makes a concurrent rotation of the same token fail
        // here instead of minting two successors.
        self.client
            .fluent()
            .delete()
            .from(collections::SESSIONS)
            .document_id(&old_doc_id)
            .precondition(FirestoreWritePrecondition::Exists(true))
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add session delete to transaction: {}", e))
            })?;

        self.client
            .fluent()
            .update()
            .in_col(collections::SESSIONS)
            .document_id(SessionEntry::document_id(&new_session.refresh_token))
            .object(new_session)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add session to transaction: {}", e))
            })?;

        if let Err(e) = transaction.commit().await {
            if self.owned_session(user_id, old_token).await?.is_none() {
                tracing::warn!(user_id, "Session rotated concurrently, rejecting replay");
                return Ok(false);
            }
            return Err(AppError::Database(format!("Transaction commit failed: {}", e)));
        }

        Ok(true)
    }

    async fn remove_session(&self, user_id: &str, refresh_token: &str) -> Result<bool, AppError> {
        let Some(doc_id) = self.owned_session(user_id, refresh_token).await? else {
            return Ok(false);
        };

        // A rotation that consumed the token between the check and this
        // delete fails the precondition, so logout never reports success for
        // a token that already has a live successor.
        let deleted = self
            .client
            .fluent()
            .delete()
            .from(collections::SESSIONS)
            .document_id(&doc_id)
            .precondition(FirestoreWritePrecondition::Exists(true))
            .execute()
            .await;

        if let Err(e) = deleted {
            if self.owned_session(user_id, refresh_token).await?.is_none() {
                tracing::debug!(user_id, "Session already consumed, nothing to remove");
                return Ok(false);
            }
            return Err(AppError::Database(format!("Session delete failed: {}", e)));
        }
        Ok(true)
    }

    async fn list_sessions(&self, user_id: &str) -> Result<Vec<SessionEntry>, AppError> {
        let user_id = user_id.to_string();
        self.client
            .fluent()
            .select()
            .from(collections::SESSIONS)
            .filter(move |q| q.for_all([q.field("user_id").eq(user_id.clone())]))
            .order_by([("created_at", FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Playlist Operations ─────────────────────────────────────

    async fn get_playlist(&self, playlist_id: &str) -> Result<Option<Playlist>, AppError> {
        self.get_doc(collections::PLAYLISTS, playlist_id).await
    }

    async fn list_playlists(&self, owner_id: &str) -> Result<Vec<Playlist>, AppError> {
        let owner_id = owner_id.to_string();
        self.client
            .fluent()
            .select()
            .from(collections::PLAYLISTS)
            .filter(move |q| q.for_all([q.field("created_by").eq(owner_id.clone())]))
            .order_by([("created_at", FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store a playlist and its videos.
    ///
    /// The playlist document is committed with the first chunk of videos
    /// under an `Exists(false)` precondition. Playlists too large for one
    /// transaction continue in further chunks; if one of those fails, the
    /// already-written documents are deleted again.
    async fn insert_playlist(
        &self,
        playlist: &Playlist,
        videos: &[Video],
    ) -> Result<bool, AppError> {
        let first_chunk_len = videos.len().min(BATCH_SIZE - 1);
        let (first, rest) = videos.split_at(first_chunk_len);

        let mut transaction = self
            .client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        self.client
            .fluent()
            .update()
            .in_col(collections::PLAYLISTS)
            .precondition(FirestoreWritePrecondition::Exists(false))
            .document_id(&playlist.id)
            .object(playlist)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add playlist to transaction: {}", e))
            })?;

        for video in first {
            self.client
                .fluent()
                .update()
                .in_col(collections::VIDEOS)
                .document_id(&video.id)
                .object(video)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add video to transaction: {}", e))
                })?;
        }

        if let Err(e) = transaction.commit().await {
            if self.get_playlist(&playlist.id).await?.is_some() {
                tracing::debug!(playlist_id = %playlist.id, "Playlist imported concurrently");
                return Ok(false);
            }
            return Err(AppError::Database(format!("Transaction commit failed: {}", e)));
        }

        let mut written = first_chunk_len;
        for chunk in rest.chunks(BATCH_SIZE) {
            let result = async {
                let mut transaction = self.client.begin_transaction().await.map_err(|e| {
                    AppError::Database(format!("Failed to begin transaction: {}", e))
                })?;
                for video in chunk {
                    self.client
                        .fluent()
                        .update()
                        .in_col(collections::VIDEOS)
                        .document_id(&video.id)
                        .object(video)
                        .add_to_transaction(&mut transaction)
                        .map_err(|e| {
                            AppError::Database(format!(
                                "Failed to add video to transaction: {}",
                                e
                            ))
                        })?;
                }
                transaction
                    .commit()
                    .await
                    .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;
                Ok::<_, AppError>(())
            }
            .await;

            if let Err(e) = result {
                tracing::error!(
                    playlist_id = %playlist.id,
                    written,
                    error = %e,
                    "Playlist import write failed, removing partial import"
                );
                self.delete_doc(collections::PLAYLISTS, &playlist.id).await?;
                self.batch_delete(&videos[..written], collections::VIDEOS, |v: &Video| {
                    v.id.clone()
                })
                .await?;
                return Err(e);
            }
            written += chunk.len();
        }

        tracing::info!(
            playlist_id = %playlist.id,
            videos = videos.len(),
            "Playlist stored"
        );
        Ok(true)
    }

    async fn delete_playlist(&self, playlist_id: &str) -> Result<Option<usize>, AppError> {
        if self.get_playlist(playlist_id).await?.is_none() {
            return Ok(None);
        }

        let videos = self.list_videos(playlist_id).await?;

        // Playlist first: once it is gone its videos are unreachable, so a
        // failure part-way through the video chunks leaves nothing visible.
        self.delete_doc(collections::PLAYLISTS, playlist_id).await?;
        self.batch_delete(&videos, collections::VIDEOS, |v: &Video| v.id.clone())
            .await?;

        tracing::info!(playlist_id, videos = videos.len(), "Playlist deleted");
        Ok(Some(videos.len()))
    }

    // ─── Video Operations ────────────────────────────────────────

    async fn get_video(&self, video_id: &str) -> Result<Option<Video>, AppError> {
        self.get_doc(collections::VIDEOS, video_id).await
    }

    async fn list_videos(&self, playlist_id: &str) -> Result<Vec<Video>, AppError> {
        let playlist_id = playlist_id.to_string();
        self.client
            .fluent()
            .select()
            .from(collections::VIDEOS)
            .filter(move |q| q.for_all([q.field("in_playlist").eq(playlist_id.clone())]))
            .order_by([("order", FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn update_video(
        &self,
        video_id: &str,
        patch: &VideoPatch,
    ) -> Result<Option<Video>, AppError> {
        let target = video_id.to_string();
        let patch = patch.clone();

        // Reads through the transaction's `db` lock the video, so two
        // concurrent identical updates serialize and the second sees a zero
        // delta when it is retried.
        let outcome = self
            .client
            .run_transaction::<_, _, FirestoreError>(|db, transaction| {
                let video_id = target.clone();
                let patch = patch.clone();
                async move {
                    let current: Option<Video> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::VIDEOS)
                        .obj()
                        .one(&video_id)
                        .await?;
                    let Some(mut video) = current else {
                        return Ok(None);
                    };
                    let delta = patch.apply(&mut video);

                    db.fluent()
                        .update()
                        .fields(["title", "description", "completed"])
                        .in_col(collections::VIDEOS)
                        .precondition(FirestoreWritePrecondition::Exists(true))
                        .document_id(&video_id)
                        .object(&video)
                        .add_to_transaction(transaction)?;

                    add_counter_transform(&db, transaction, &video.in_playlist, delta)?;

                    Ok(Some((video, delta)))
                }
                .boxed()
            })
            .await
            .map_err(|e| AppError::Database(format!("Video update transaction failed: {}", e)))?;

        let Some((video, delta)) = outcome else {
            return Ok(None);
        };

        tracing::debug!(
            video_id,
            completed = video.completed,
            completed_delta = delta.completed,
            "Video updated"
        );
        Ok(Some(video))
    }

    async fn delete_video(&self, video_id: &str) -> Result<Option<Video>, AppError> {
        let target = video_id.to_string();

        // The video and every later sibling are read inside the transaction,
        // so concurrent deletes in one playlist retry instead of shifting
        // from stale positions. The delete, the counter update, and as many
        // order shifts as fit share this transaction.
        let outcome = self
            .client
            .run_transaction::<_, _, FirestoreError>(|db, transaction| {
                let video_id = target.clone();
                async move {
                    let current: Option<Video> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::VIDEOS)
                        .obj()
                        .one(&video_id)
                        .await?;
                    let Some(video) = current else {
                        return Ok(None);
                    };

                    let removed_order = video.order;
                    let playlist_id = video.in_playlist.clone();
                    let later: Vec<Video> = db
                        .fluent()
                        .select()
                        .from(collections::VIDEOS)
                        .filter(move |q| {
                            q.for_all([
                                q.field("in_playlist").eq(playlist_id.clone()),
                                q.field("order").greater_than(removed_order),
                            ])
                        })
                        .obj()
                        .query()
                        .await?;

                    db.fluent()
                        .delete()
                        .from(collections::VIDEOS)
                        .document_id(&video_id)
                        .precondition(FirestoreWritePrecondition::Exists(true))
                        .add_to_transaction(transaction)?;

                    add_counter_transform(
                        &db,
                        transaction,
                        &video.in_playlist,
                        CounterDelta::removal(&video),
                    )?;

                    let first_len = later.len().min(BATCH_SIZE - 2);
                    for shifted in &later[..first_len] {
                        add_order_shift(&db, transaction, &shifted.id)?;
                    }
                    let rest: Vec<String> =
                        later[first_len..].iter().map(|v| v.id.clone()).collect();

                    Ok(Some((video, later.len(), rest)))
                }
                .boxed()
            })
            .await
            .map_err(|e| AppError::Database(format!("Video delete transaction failed: {}", e)))?;

        let Some((video, shifted, rest)) = outcome else {
            return Ok(None);
        };

        for chunk in rest.chunks(BATCH_SIZE) {
            let mut transaction = self
                .client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;
            for id in chunk {
                add_order_shift(&self.client, &mut transaction, id).map_err(|e| {
                    AppError::Database(format!("Failed to add order shift to transaction: {}", e))
                })?;
            }
            transaction
                .commit()
                .await
                .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;
        }

        tracing::info!(
            video_id,
            playlist_id = %video.in_playlist,
            shifted,
            "Video deleted"
        );
        Ok(Some(video))
    }

    // ─── Event Operations ────────────────────────────────────────

    async fn insert_event(&self, event: &Event) -> Result<(), AppError> {
        self.set_doc(collections::EVENTS, &event.id, event).await
    }

    async fn get_event(&self, event_id: &str) -> Result<Option<Event>, AppError> {
        self.get_doc(collections::EVENTS, event_id).await
    }

    async fn list_events(&self, owner_id: &str) -> Result<Vec<Event>, AppError> {
        let owner_id = owner_id.to_string();
        self.client
            .fluent()
            .select()
            .from(collections::EVENTS)
            .filter(move |q| q.for_all([q.field("created_by").eq(owner_id.clone())]))
            .order_by([("start", FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn delete_event(&self, event_id: &str) -> Result<bool, AppError> {
        if self.get_event(event_id).await?.is_none() {
            return Ok(false);
        }
        self.delete_doc(collections::EVENTS, event_id).await?;
        Ok(true)
    }

    // ─── Note Operations ─────────────────────────────────────────

    async fn insert_note(&self, note: &Note) -> Result<(), AppError> {
        self.set_doc(collections::NOTES, &note.id, note).await
    }

    async fn get_note(&self, note_id: &str) -> Result<Option<Note>, AppError> {
        self.get_doc(collections::NOTES, note_id).await
    }

    async fn list_notes(&self, owner_id: &str) -> Result<Vec<Note>, AppError> {
        let owner_id = owner_id.to_string();
        self.client
            .fluent()
            .select()
            .from(collections::NOTES)
            .filter(move |q| q.for_all([q.field("created_by").eq(owner_id.clone())]))
            .order_by([("created_at", FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn list_notes_for_video(
        &self,
        owner_id: &str,
        video_id: &str,
    ) -> Result<Vec<Note>, AppError> {
        let owner_id = owner_id.to_string();
        let video_id = video_id.to_string();
        let mut notes: Vec<Note> = self
            .client
            .fluent()
            .select()
            .from(collections::NOTES)
            .filter(move |q| {
                q.for_all([
                    q.field("created_by").eq(owner_id.clone()),
                    q.field("in_video").eq(video_id.clone()),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        // Sorted here: notes without a timestamp are excluded by a Firestore order_by.
        sort_by_timestamp(&mut notes);
        Ok(notes)
    }

    async fn update_note(
        &self,
        note_id: &str,
        patch: &NotePatch,
        now: &str,
    ) -> Result<Option<Note>, AppError> {
        let Some(mut note) = self.get_note(note_id).await? else {
            return Ok(None);
        };
        patch.apply(&mut note, now);
        self.set_doc(collections::NOTES, note_id, &note).await?;
        Ok(Some(note))
    }

    async fn delete_note(&self, note_id: &str) -> Result<bool, AppError> {
        if self.get_note(note_id).await?.is_none() {
            return Ok(false);
        }
        self.delete_doc(collections::NOTES, note_id).await?;
        Ok(true)
    }
}
