use crate::Database;
use crate::filter::Filter;
use crate::models::{
    ConfigRow, EstablishmentFilter, EstablishmentRow, FollowersRow, PostFilter, PostRow,
    UserFilter, UserRow,
};
use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

const USER_COLUMNS: &str = "id, name, nick, email, password, inactive, created_at";
const POST_COLUMNS: &str = "id, title, content, author_id, author_nick, likes, created_at";
const ESTABLISHMENT_COLUMNS: &str = "id, cnpj, ie, name, email, phone, sector, opening_hours, \
     opening_days, cep, number, street, district, city, uf, country, complement, created_at";

impl Database {
    // -- Configs --

    pub fn get_config(&self, name: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            let value = conn
                .query_row("SELECT value FROM configs WHERE name = ?1", [name], |row| row.get(0))
                .optional()?;
            Ok(value)
        })
    }

    /// Returns the stored value, or `default` when the key is absent or unreadable.
    pub fn get_config_or(&self, name: &str, default: &str) -> String {
        match self.get_config(name) {
            Ok(Some(value)) => value,
            Ok(None) => default.to_string(),
            Err(e) => {
                tracing::warn!(config = name, "Config read failed, using default: {}", e);
                default.to_string()
            }
        }
    }

    pub fn put_config(&self, name: &str, value: &str) -> Result<()> {
        if name.is_empty() {
            bail!("config name cannot be empty");
        }
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO configs (name, value) VALUES (?1, ?2)
                 ON CONFLICT(name) DO UPDATE SET value = excluded.value",
                (name, value),
            )?;
            Ok(())
        })
    }

    pub fn list_configs(&self) -> Result<Vec<ConfigRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT name, value FROM configs ORDER BY name")?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(ConfigRow {
                        name: row.get(0)?,
                        value: row.get(1)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Users --

    pub fn get_user(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, id))
    }

    /// Batch lookup. Missing ids are skipped, so a batch where every id
    /// misses yields an empty vector rather than an error.
    pub fn get_users(&self, ids: &[i64]) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| collect_found(ids, |id| query_user(conn, id)))
    }

    /// Insert-or-replace keyed by `user.id`; an id of 0 assigns a new one.
    pub fn put_user(&self, user: &mut UserRow) -> Result<i64> {
        self.with_conn(|conn| {
            if user.id == 0 {
                conn.execute(
                    "INSERT INTO users (name, nick, email, password, inactive, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![user.name, user.nick, user.email, user.password, user.inactive, user.created_at],
                )?;
                user.id = conn.last_insert_rowid();
            } else {
                conn.execute(
                    "INSERT OR REPLACE INTO users (id, name, nick, email, password, inactive, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        user.id,
                        user.name,
                        user.nick,
                        user.email,
                        user.password,
                        user.inactive,
                        user.created_at
                    ],
                )?;
            }
            Ok(user.id)
        })
    }

    pub fn filter_users(&self, filter: &UserFilter) -> Result<Vec<i64>> {
        let query = Filter::new()
            .eq("id", filter.id)
            .eq("name", filter.name.clone())
            .eq("nick", filter.nick.clone())
            .eq("email", filter.email.clone());
        self.with_conn(|conn| query.ids(conn, "users"))
    }

    /// Deletes the identity together with its posts, its relationship record
    /// and every follow it made. Returns false when the id did not exist.
    pub fn delete_user(&self, id: i64) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let removed = tx.execute("DELETE FROM users WHERE id = ?1", [id])?;
            tx.execute("DELETE FROM posts WHERE author_id = ?1", [id])?;
            tx.execute("DELETE FROM followers WHERE user_id = ?1", [id])?;

            let followed = query_followed_by(&tx, id)?;
            for user_id in followed {
                if let Some(mut record) = query_followers(&tx, user_id)? {
                    record.follower_ids.retain(|f| *f != id);
                    write_followers(&tx, &record)?;
                }
            }

            tx.commit()?;
            Ok(removed > 0)
        })
    }

    // -- Followers --

    pub fn get_followers(&self, user_id: i64) -> Result<Option<FollowersRow>> {
        self.with_conn(|conn| query_followers(conn, user_id))
    }

    pub fn put_followers(&self, record: &FollowersRow) -> Result<()> {
        self.with_conn(|conn| write_followers(conn, record))
    }

    /// Ids of the identities `follower_id` follows.
    pub fn followed_by(&self, follower_id: i64) -> Result<Vec<i64>> {
        self.with_conn(|conn| query_followed_by(conn, follower_id))
    }

    // -- Posts --

    pub fn get_post(&self, id: i64) -> Result<Option<PostRow>> {
        self.with_conn(|conn| query_post(conn, id))
    }

    pub fn get_posts(&self, ids: &[i64]) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| collect_found(ids, |id| query_post(conn, id)))
    }

    pub fn put_post(&self, post: &mut PostRow) -> Result<i64> {
        self.with_conn(|conn| {
            if post.id == 0 {
                conn.execute(
                    "INSERT INTO posts (title, content, author_id, author_nick, likes, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![post.title, post.content, post.author_id, post.author_nick, post.likes, post.created_at],
                )?;
                post.id = conn.last_insert_rowid();
            } else {
                conn.execute(
                    "INSERT OR REPLACE INTO posts (id, title, content, author_id, author_nick, likes, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        post.id,
                        post.title,
                        post.content,
                        post.author_id,
                        post.author_nick,
                        post.likes,
                        post.created_at
                    ],
                )?;
            }
            Ok(post.id)
        })
    }

    pub fn filter_posts(&self, filter: &PostFilter) -> Result<Vec<i64>> {
        let query = Filter::new()
            .eq("id", filter.id)
            .eq("author_id", filter.author_id)
            .eq("author_nick", filter.author_nick.clone());
        self.with_conn(|conn| query.ids(conn, "posts"))
    }

    pub fn delete_post(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute("DELETE FROM posts WHERE id = ?1", [id])?;
            Ok(removed > 0)
        })
    }

    // -- Establishments --

    pub fn get_establishment(&self, id: i64) -> Result<Option<EstablishmentRow>> {
        self.with_conn(|conn| query_establishment(conn, id))
    }

    pub fn get_establishments(&self, ids: &[i64]) -> Result<Vec<EstablishmentRow>> {
        self.with_conn(|conn| collect_found(ids, |id| query_establishment(conn, id)))
    }

    pub fn put_establishment(&self, est: &mut EstablishmentRow) -> Result<i64> {
        self.with_conn(|conn| {
            let id = if est.id == 0 { None } else { Some(est.id) };
            conn.execute(
                "INSERT OR REPLACE INTO establishments (id, cnpj, ie, name, email, phone, sector,
                     opening_hours, opening_days, cep, number, street, district, city, uf, country,
                     complement, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
                params![
                    id,
                    est.cnpj,
                    est.ie,
                    est.name,
                    est.email,
                    est.phone,
                    est.sector,
                    est.opening_hours,
                    est.opening_days,
                    est.cep,
                    est.number,
                    est.street,
                    est.district,
                    est.city,
                    est.uf,
                    est.country,
                    est.complement,
                    est.created_at
                ],
            )?;
            if est.id == 0 {
                est.id = conn.last_insert_rowid();
            }
            Ok(est.id)
        })
    }

    pub fn filter_establishments(&self, filter: &EstablishmentFilter) -> Result<Vec<i64>> {
        let query = Filter::new()
            .eq("id", filter.id)
            .eq("name", filter.name.clone())
            .eq("cnpj", filter.cnpj.clone())
            .eq("ie", filter.ie.clone());
        self.with_conn(|conn| query.ids(conn, "establishments"))
    }
}

fn collect_found<T>(ids: &[i64], mut fetch: impl FnMut(i64) -> Result<Option<T>>) -> Result<Vec<T>> {
    let mut found = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(item) = fetch(*id)? {
            found.push(item);
        }
    }
    Ok(found)
}

fn user_from_row(row: &Row) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        name: row.get(1)?,
        nick: row.get(2)?,
        email: row.get(3)?,
        password: row.get(4)?,
        inactive: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn query_user(conn: &Connection, id: i64) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS);
    let row = conn.query_row(&sql, [id], user_from_row).optional()?;
    Ok(row)
}

fn query_followers(conn: &Connection, user_id: i64) -> Result<Option<FollowersRow>> {
    let raw = conn
        .query_row(
            "SELECT follower_ids, created_at FROM followers WHERE user_id = ?1",
            [user_id],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, DateTime<Utc>>(1)?)),
        )
        .optional()?;

    match raw {
        Some((ids, created_at)) => Ok(Some(FollowersRow {
            user_id,
            follower_ids: serde_json::from_str(&ids)?,
            created_at,
        })),
        None => Ok(None),
    }
}

fn write_followers(conn: &Connection, record: &FollowersRow) -> Result<()> {
    let ids = serde_json::to_string(&record.follower_ids)?;
    conn.execute(
        "INSERT OR REPLACE INTO followers (user_id, follower_ids, created_at) VALUES (?1, ?2, ?3)",
        params![record.user_id, ids, record.created_at],
    )?;
    Ok(())
}

fn query_followed_by(conn: &Connection, follower_id: i64) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT f.user_id
         FROM followers f, json_each(f.follower_ids) j
         WHERE j.value = ?1
         ORDER BY f.user_id",
    )?;
    let ids = stmt
        .query_map([follower_id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<i64>, _>>()?;
    Ok(ids)
}

fn query_post(conn: &Connection, id: i64) -> Result<Option<PostRow>> {
    let sql = format!("SELECT {} FROM posts WHERE id = ?1", POST_COLUMNS);
    let row = conn
        .query_row(&sql, [id], |row| {
            Ok(PostRow {
                id: row.get(0)?,
                title: row.get(1)?,
                content: row.get(2)?,
                author_id: row.get(3)?,
                author_nick: row.get(4)?,
                likes: row.get(5)?,
                created_at: row.get(6)?,
            })
        })
        .optional()?;
    Ok(row)
}

fn query_establishment(conn: &Connection, id: i64) -> Result<Option<EstablishmentRow>> {
    let sql = format!("SELECT {} FROM establishments WHERE id = ?1", ESTABLISHMENT_COLUMNS);
    let row = conn
        .query_row(&sql, [id], |row| {
            Ok(EstablishmentRow {
                id: row.get(0)?,
                cnpj: row.get(1)?,
                ie: row.get(2)?,
                name: row.get(3)?,
                email: row.get(4)?,
                phone: row.get(5)?,
                sector: row.get(6)?,
                opening_hours: row.get(7)?,
                opening_days: row.get(8)?,
                cep: row.get(9)?,
                number: row.get(10)?,
                street: row.get(11)?,
                district: row.get(12)?,
                city: row.get(13)?,
                uf: row.get(14)?,
                country: row.get(15)?,
                complement: row.get(16)?,
                created_at: row.get(17)?,
            })
        })
        .optional()?;
    Ok(row)
}
