//! `SQLite`-backed reference implementation of [`Store`].
//!
//! Grounded on the teacher's `storage/sqlite.rs` (connection setup: `WAL`
//! mode, `foreign_keys` pragma, parent-directory creation) and
//! `storage/schema.rs` (versioned `CREATE TABLE IF NOT EXISTS` schema). Since
//! `rusqlite` is synchronous, every operation runs inside
//! `tokio::task::spawn_blocking`, serialized through a single shared
//! connection guarded by a `Mutex` — acceptable for a reference adapter
//! backing a single-user terminal chat.

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]

use crate::core::{Chat, Document, DocumentChunk, Message, ProfileFact, Role, UserProfile};
use crate::error::{Error, Result, StoreError};
use crate::store::Store;
use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Current schema version, tracked in `schema_info`.
const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Schema for a freshly created database.
const SCHEMA_SQL: &str = r"
CREATE TABLE IF NOT EXISTS schema_info (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS chats (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    system_prompt TEXT NOT NULL,
    model TEXT NOT NULL,
    embedding_model TEXT NOT NULL,
    top_k INTEGER NOT NULL,
    use_reranking INTEGER NOT NULL,
    temperature REAL NOT NULL,
    max_tokens INTEGER NOT NULL,
    context_window INTEGER NOT NULL,
    file_count INTEGER NOT NULL,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS messages (
    id TEXT PRIMARY KEY,
    chat_id TEXT NOT NULL,
    role TEXT NOT NULL,
    content TEXT NOT NULL,
    timestamp INTEGER NOT NULL,
    embedding BLOB,
    FOREIGN KEY (chat_id) REFERENCES chats(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_messages_chat ON messages(chat_id, timestamp);

CREATE TABLE IF NOT EXISTS documents (
    id TEXT PRIMARY KEY,
    chat_id TEXT NOT NULL,
    file_path TEXT NOT NULL,
    file_name TEXT NOT NULL,
    mime_type TEXT NOT NULL,
    file_size INTEGER NOT NULL,
    encoding TEXT NOT NULL,
    content_hash TEXT NOT NULL,
    chunk_count INTEGER NOT NULL,
    uploaded_at INTEGER NOT NULL,
    metadata TEXT NOT NULL,
    FOREIGN KEY (chat_id) REFERENCES chats(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_documents_chat ON documents(chat_id);
CREATE INDEX IF NOT EXISTS idx_documents_hash ON documents(chat_id, content_hash);

CREATE TABLE IF NOT EXISTS document_chunks (
    id TEXT PRIMARY KEY,
    document_id TEXT NOT NULL,
    chat_id TEXT NOT NULL,
    chunk_index INTEGER NOT NULL,
    content TEXT NOT NULL,
    start_pos INTEGER NOT NULL,
    end_pos INTEGER NOT NULL,
    file_path TEXT NOT NULL,
    embedding BLOB NOT NULL,
    FOREIGN KEY (document_id) REFERENCES documents(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_chunks_document ON document_chunks(document_id, chunk_index);
CREATE INDEX IF NOT EXISTS idx_chunks_chat ON document_chunks(chat_id);

CREATE TABLE IF NOT EXISTS profile_facts (
    chat_id TEXT NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    confidence REAL NOT NULL,
    source TEXT NOT NULL,
    context TEXT NOT NULL,
    first_seen INTEGER NOT NULL,
    last_seen INTEGER NOT NULL,
    PRIMARY KEY (chat_id, key),
    FOREIGN KEY (chat_id) REFERENCES chats(id) ON DELETE CASCADE
);
";

/// SQL checking whether the schema has been created.
const CHECK_SCHEMA_SQL: &str = "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='schema_info';";
const GET_VERSION_SQL: &str = "SELECT value FROM schema_info WHERE key = 'version';";
const SET_VERSION_SQL: &str = "INSERT OR REPLACE INTO schema_info (key, value) VALUES ('version', ?);";

/// A `SQLite`-backed [`Store`].
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Opens or creates a database at `path`, creating parent directories
    /// and running the schema if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(&path)?;
        Self::init_connection(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: Some(path),
        })
    }

    /// Opens an in-memory database. Useful for tests.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_connection(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: None,
        })
    }

    /// Returns the database path (`None` for in-memory stores).
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn init_connection(conn: &Connection) -> Result<()> {
        conn.execute("PRAGMA foreign_keys = ON;", [])?;
        let _: String = conn.query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))?;

        let is_init: i64 = conn.query_row(CHECK_SCHEMA_SQL, [], |row| row.get(0))?;
        if is_init == 0 {
            conn.execute_batch(SCHEMA_SQL)?;
            conn.execute(SET_VERSION_SQL, params![CURRENT_SCHEMA_VERSION.to_string()])?;
        } else {
            let version: Option<String> = conn.query_row(GET_VERSION_SQL, [], |row| row.get(0)).optional()?;
            if version.and_then(|v| v.parse::<u32>().ok()).unwrap_or(0) < CURRENT_SCHEMA_VERSION {
                conn.execute_batch(SCHEMA_SQL)?;
                conn.execute(SET_VERSION_SQL, params![CURRENT_SCHEMA_VERSION.to_string()])?;
            }
        }
        Ok(())
    }

    /// Runs `f` against the shared connection on a blocking thread.
    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| Error::Store(StoreError::Database("connection mutex poisoned".to_string())))?;
            f(&guard)
        })
        .await
        .map_err(|e| Error::Store(StoreError::Database(format!("blocking task panicked: {e}"))))?
    }
}

fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for v in embedding {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

fn blob_to_embedding(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4).map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]])).collect()
}

fn str_to_role(s: &str) -> Result<Role> {
    match s {
        "user" => Ok(Role::User),
        "assistant" => Ok(Role::Assistant),
        "context" => Ok(Role::Context),
        other => Err(Error::Store(StoreError::Database(format!("unknown role: {other}")))),
    }
}

fn timestamp_to_unix(ts: chrono::DateTime<chrono::Utc>) -> i64 {
    ts.timestamp()
}

fn unix_to_timestamp(secs: i64) -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::from_timestamp(secs, 0).unwrap_or_else(chrono::Utc::now)
}

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    let role_str: String = row.get(2)?;
    let embedding_blob: Option<Vec<u8>> = row.get(5)?;
    Ok(Message {
        id: row.get(0)?,
        chat_id: row.get(1)?,
        role: str_to_role(&role_str).unwrap_or(Role::User),
        content: row.get(3)?,
        timestamp: unix_to_timestamp(row.get(4)?),
        embedding: embedding_blob.map(|b| blob_to_embedding(&b)),
    })
}

fn row_to_document(row: &rusqlite::Row<'_>) -> rusqlite::Result<Document> {
    let metadata_json: String = row.get(10)?;
    let metadata = serde_json::from_str(&metadata_json).unwrap_or_default();
    Ok(Document {
        id: row.get(0)?,
        chat_id: row.get(1)?,
        file_path: row.get(2)?,
        file_name: row.get(3)?,
        mime_type: row.get(4)?,
        file_size: row.get::<_, i64>(5)? as u64,
        encoding: row.get(6)?,
        content_hash: row.get(7)?,
        chunk_count: row.get::<_, i64>(8)? as usize,
        uploaded_at: unix_to_timestamp(row.get(9)?),
        metadata,
    })
}

fn row_to_chunk(row: &rusqlite::Row<'_>) -> rusqlite::Result<DocumentChunk> {
    let embedding_blob: Vec<u8> = row.get(8)?;
    Ok(DocumentChunk {
        id: row.get(0)?,
        document_id: row.get(1)?,
        chat_id: row.get(2)?,
        chunk_index: row.get::<_, i64>(3)? as usize,
        content: row.get(4)?,
        start_pos: row.get::<_, i64>(5)? as usize,
        end_pos: row.get::<_, i64>(6)? as usize,
        file_path: row.get(7)?,
        embedding: blob_to_embedding(&embedding_blob),
    })
}

fn row_to_fact(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProfileFact> {
    let source_str: String = row.get(3)?;
    let source = match source_str.as_str() {
        "explicit" => crate::core::profile::FactSource::Explicit,
        _ => crate::core::profile::FactSource::Inferred,
    };
    Ok(ProfileFact {
        key: row.get(0)?,
        value: row.get(1)?,
        confidence: row.get(2)?,
        source,
        context: row.get(4)?,
        first_seen: unix_to_timestamp(row.get(5)?),
        last_seen: unix_to_timestamp(row.get(6)?),
    })
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn scored_context_messages(conn: &Connection, chat_id: &str, query_vec: &[f32], k: usize) -> Result<Vec<Message>> {
    let mut msg_stmt = conn.prepare(
        "SELECT id, chat_id, role, content, timestamp, embedding FROM messages
         WHERE chat_id = ?1 AND role = 'context' AND embedding IS NOT NULL",
    )?;
    let mut scored: Vec<(f32, Message)> = msg_stmt
        .query_map(params![chat_id], row_to_message)?
        .filter_map(std::result::Result::ok)
        .map(|m| {
            let score = m.embedding.as_deref().map_or(0.0, |e| cosine_similarity(query_vec, e));
            (score, m)
        })
        .collect();
    scored.sort_by(|a, b| {
        b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal).then_with(|| b.1.timestamp.cmp(&a.1.timestamp))
    });
    scored.truncate(k);
    Ok(scored.into_iter().map(|(_, m)| m).collect())
}

#[async_trait]
impl Store for SqliteStore {
    async fn create_chat(&self, chat: &Chat) -> Result<()> {
        let chat = chat.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO chats (id, name, system_prompt, model, embedding_model, top_k, use_reranking,
                    temperature, max_tokens, context_window, file_count, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    chat.id,
                    chat.name,
                    chat.system_prompt,
                    chat.model,
                    chat.embedding_model,
                    chat.top_k as i64,
                    i64::from(chat.use_reranking),
                    chat.temperature,
                    chat.max_tokens as i64,
                    chat.context_window as i64,
                    chat.file_count as i64,
                    timestamp_to_unix(chat.created_at),
                    timestamp_to_unix(chat.updated_at),
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn get_chat(&self, chat_id: &str) -> Result<Option<Chat>> {
        let chat_id = chat_id.to_string();
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT id, name, system_prompt, model, embedding_model, top_k, use_reranking,
                    temperature, max_tokens, context_window, file_count, created_at, updated_at
                 FROM chats WHERE id = ?1",
                params![chat_id],
                |row| {
                    Ok(Chat {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        system_prompt: row.get(2)?,
                        model: row.get(3)?,
                        embedding_model: row.get(4)?,
                        top_k: row.get::<_, i64>(5)? as usize,
                        use_reranking: row.get::<_, i64>(6)? != 0,
                        temperature: row.get(7)?,
                        max_tokens: row.get::<_, i64>(8)? as usize,
                        context_window: row.get::<_, i64>(9)? as usize,
                        file_count: row.get::<_, i64>(10)? as usize,
                        created_at: unix_to_timestamp(row.get(11)?),
                        updated_at: unix_to_timestamp(row.get(12)?),
                    })
                },
            )
            .optional()
            .map_err(Error::from)
        })
        .await
    }

    async fn update_chat(&self, chat: &Chat) -> Result<()> {
        let chat = chat.clone();
        self.with_conn(move |conn| {
            let rows = conn.execute(
                "UPDATE chats SET name = ?2, system_prompt = ?3, model = ?4, embedding_model = ?5,
                    top_k = ?6, use_reranking = ?7, temperature = ?8, max_tokens = ?9,
                    context_window = ?10, file_count = ?11, updated_at = ?12
                 WHERE id = ?1",
                params![
                    chat.id,
                    chat.name,
                    chat.system_prompt,
                    chat.model,
                    chat.embedding_model,
                    chat.top_k as i64,
                    i64::from(chat.use_reranking),
                    chat.temperature,
                    chat.max_tokens as i64,
                    chat.context_window as i64,
                    chat.file_count as i64,
                    timestamp_to_unix(chat.updated_at),
                ],
            )?;
            if rows == 0 {
                return Err(Error::Store(StoreError::ChatNotFound { chat_id: chat.id.clone() }));
            }
            Ok(())
        })
        .await
    }

    async fn store_message(&self, message: &Message) -> Result<()> {
        let message = message.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO messages (id, chat_id, role, content, timestamp, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    message.id,
                    message.chat_id,
                    message.role.label(),
                    message.content,
                    timestamp_to_unix(message.timestamp),
                    message.embedding.as_deref().map(embedding_to_blob),
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn get_all_messages(&self, chat_id: &str) -> Result<Vec<Message>> {
        let chat_id = chat_id.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, chat_id, role, content, timestamp, embedding FROM messages
                 WHERE chat_id = ?1 ORDER BY timestamp ASC",
            )?;
            let rows = stmt.query_map(params![chat_id], row_to_message)?;
            let mut messages = Vec::new();
            for row in rows {
                messages.push(row?);
            }
            Ok(messages)
        })
        .await
    }

    async fn search_similar(&self, chat_id: &str, query_vec: &[f32], k: usize) -> Result<Vec<Message>> {
        let chat_id = chat_id.to_string();
        let query_vec = query_vec.to_vec();
        self.with_conn(move |conn| scored_context_messages(conn, &chat_id, &query_vec, k)).await
    }

    async fn search_similar_context_and_chunks(
        &self,
        chat_id: &str,
        query_vec: &[f32],
        k: usize,
    ) -> Result<(Vec<Message>, Vec<DocumentChunk>)> {
        let chat_id = chat_id.to_string();
        let query_vec = query_vec.to_vec();
        self.with_conn(move |conn| {
            let scored_messages = scored_context_messages(conn, &chat_id, &query_vec, k)?;

            let mut chunk_stmt = conn.prepare(
                "SELECT id, document_id, chat_id, chunk_index, content, start_pos, end_pos, file_path, embedding
                 FROM document_chunks WHERE chat_id = ?1",
            )?;
            let mut scored_chunks: Vec<(f32, DocumentChunk)> = chunk_stmt
                .query_map(params![chat_id], |row| {
                    let embedding_blob: Vec<u8> = row.get(8)?;
                    Ok(DocumentChunk {
                        id: row.get(0)?,
                        document_id: row.get(1)?,
                        chat_id: row.get(2)?,
                        chunk_index: row.get::<_, i64>(3)? as usize,
                        content: row.get(4)?,
                        start_pos: row.get::<_, i64>(5)? as usize,
                        end_pos: row.get::<_, i64>(6)? as usize,
                        file_path: row.get(7)?,
                        embedding: blob_to_embedding(&embedding_blob),
                    })
                })?
                .filter_map(std::result::Result::ok)
                .map(|c| {
                    let score = cosine_similarity(&query_vec, &c.embedding);
                    (score, c)
                })
                .collect();
            scored_chunks.sort_by(|a, b| {
                b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal).then_with(|| b.1.chunk_index.cmp(&a.1.chunk_index))
            });
            scored_chunks.truncate(k);

            Ok((scored_messages, scored_chunks.into_iter().map(|(_, c)| c).collect()))
        })
        .await
    }

    async fn store_document(&self, doc: &Document) -> Result<()> {
        let doc = doc.clone();
        self.with_conn(move |conn| {
            let metadata_json = serde_json::to_string(&doc.metadata).map_err(StoreError::from)?;
            conn.execute(
                "INSERT OR REPLACE INTO documents (id, chat_id, file_path, file_name, mime_type,
                    file_size, encoding, content_hash, chunk_count, uploaded_at, metadata)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    doc.id,
                    doc.chat_id,
                    doc.file_path,
                    doc.file_name,
                    doc.mime_type,
                    doc.file_size as i64,
                    doc.encoding,
                    doc.content_hash,
                    doc.chunk_count as i64,
                    timestamp_to_unix(doc.uploaded_at),
                    metadata_json,
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn find_document_by_hash(&self, chat_id: &str, hash: &str) -> Result<Option<Document>> {
        let chat_id = chat_id.to_string();
        let hash = hash.to_string();
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT id, chat_id, file_path, file_name, mime_type, file_size, encoding,
                    content_hash, chunk_count, uploaded_at, metadata
                 FROM documents WHERE chat_id = ?1 AND content_hash = ?2",
                params![chat_id, hash],
                row_to_document,
            )
            .optional()
            .map_err(Error::from)
        })
        .await
    }

    async fn get_documents(&self, chat_id: &str) -> Result<Vec<Document>> {
        let chat_id = chat_id.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, chat_id, file_path, file_name, mime_type, file_size, encoding,
                    content_hash, chunk_count, uploaded_at, metadata
                 FROM documents WHERE chat_id = ?1 ORDER BY uploaded_at ASC",
            )?;
            let rows = stmt.query_map(params![chat_id], row_to_document)?;
            let mut docs = Vec::new();
            for row in rows {
                docs.push(row?);
            }
            Ok(docs)
        })
        .await
    }

    async fn store_document_chunk(&self, chunk: &DocumentChunk) -> Result<()> {
        let chunk = chunk.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO document_chunks (id, document_id, chat_id, chunk_index,
                    content, start_pos, end_pos, file_path, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    chunk.id,
                    chunk.document_id,
                    chunk.chat_id,
                    chunk.chunk_index as i64,
                    chunk.content,
                    chunk.start_pos as i64,
                    chunk.end_pos as i64,
                    chunk.file_path,
                    embedding_to_blob(&chunk.embedding),
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn list_chunks_by_document(&self, document_id: &str) -> Result<Vec<DocumentChunk>> {
        let document_id = document_id.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, document_id, chat_id, chunk_index, content, start_pos, end_pos, file_path, embedding
                 FROM document_chunks WHERE document_id = ?1 ORDER BY chunk_index ASC",
            )?;
            let rows = stmt.query_map(params![document_id], row_to_chunk)?;
            let mut chunks = Vec::new();
            for row in rows {
                chunks.push(row?);
            }
            Ok(chunks)
        })
        .await
    }

    async fn get_user_profile(&self, chat_id: &str) -> Result<UserProfile> {
        let chat_id_owned = chat_id.to_string();
        let chat_id_for_profile = chat_id_owned.clone();
        self.with_conn(move |conn| {
            let mut stmt =
                conn.prepare("SELECT key, value, confidence, source, context, first_seen, last_seen FROM profile_facts WHERE chat_id = ?1")?;
            let rows = stmt.query_map(params![chat_id_owned], row_to_fact)?;
            let mut profile = UserProfile::new(chat_id_for_profile);
            for row in rows {
                let fact = row?;
                profile.facts.insert(fact.key.clone(), fact);
            }
            Ok(profile)
        })
        .await
    }

    async fn get_profile_fact(&self, chat_id: &str, key: &str) -> Result<Option<ProfileFact>> {
        let chat_id = chat_id.to_string();
        let key = key.to_string();
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT key, value, confidence, source, context, first_seen, last_seen
                 FROM profile_facts WHERE chat_id = ?1 AND key = ?2",
                params![chat_id, key],
                row_to_fact,
            )
            .optional()
            .map_err(Error::from)
        })
        .await
    }

    async fn upsert_profile_fact(&self, chat_id: &str, fact: ProfileFact) -> Result<()> {
        let chat_id = chat_id.to_string();
        self.with_conn(move |conn| {
            let source = match fact.source {
                crate::core::profile::FactSource::Explicit => "explicit",
                crate::core::profile::FactSource::Inferred => "inferred",
            };
            conn.execute(
                "INSERT OR REPLACE INTO profile_facts (chat_id, key, value, confidence, source,
                    context, first_seen, last_seen)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    chat_id,
                    fact.key,
                    fact.value,
                    fact.confidence,
                    source,
                    fact.context,
                    timestamp_to_unix(fact.first_seen),
                    timestamp_to_unix(fact.last_seen),
                ],
            )?;
            Ok(())
        })
        .await
    }
}
