//! [`SqliteStore`], the SQLite implementation of [`UserStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{OptionalExtension as _, ToSql};
use uuid::Uuid;

use swc_core::{
  action::{ActionType, NewUserAction, OptInType, UserAction},
  patch::UserPatch,
  store::{ExistingAction, UserStore},
  user::{NewUser, UserRecord, UserSession},
};

use crate::{
  encode::{
    ACTION_COLUMNS, ADDRESS_COLUMNS, EMAIL_COLUMNS, RawAction, RawAddress,
    RawEmailAddress, RawSession, RawUser, RawUserRecord, SESSION_COLUMNS,
    USER_COLUMNS, encode_dt, encode_uuid,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A user store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Number of rows in the `addresses` table.
  pub async fn count_addresses(&self) -> Result<usize> {
    let n: i64 = self
      .conn
      .call(|conn| {
        Ok(conn.query_row("SELECT COUNT(*) FROM addresses", [], |r| r.get(0))?)
      })
      .await?;
    Ok(n as usize)
  }

  /// Number of rows in the `users` table.
  pub async fn count_users(&self) -> Result<usize> {
    let n: i64 = self
      .conn
      .call(|conn| {
        Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))?)
      })
      .await?;
    Ok(n as usize)
  }
}

// ─── Synchronous helpers (run inside `Connection::call`) ─────────────────────

/// Load a user and all of its relations.
fn load_user_record(
  conn: &rusqlite::Connection,
  user_id: &str,
) -> rusqlite::Result<Option<RawUserRecord>> {
  let user = conn
    .query_row(
      &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
      rusqlite::params![user_id],
      RawUser::from_row,
    )
    .optional()?;

  let Some(user) = user else {
    return Ok(None);
  };

  let email_addresses = conn
    .prepare(&format!(
      "SELECT {EMAIL_COLUMNS} FROM user_email_addresses
       WHERE user_id = ?1 ORDER BY rowid"
    ))?
    .query_map(rusqlite::params![user_id], RawEmailAddress::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let sessions = conn
    .prepare(&format!(
      "SELECT {SESSION_COLUMNS} FROM user_sessions
       WHERE user_id = ?1 ORDER BY rowid"
    ))?
    .query_map(rusqlite::params![user_id], RawSession::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let address = match user.address_id.as_deref() {
    Some(address_id) => conn
      .query_row(
        &format!("SELECT {ADDRESS_COLUMNS} FROM addresses WHERE id = ?1"),
        rusqlite::params![address_id],
        RawAddress::from_row,
      )
      .optional()?,
    None => None,
  };

  Ok(Some(RawUserRecord { user, email_addresses, sessions, address }))
}

/// Reuse the address with the same place id if there is one; otherwise
/// insert `address`. Returns the id of the row to connect.
fn connect_or_create_address(
  conn: &rusqlite::Connection,
  address: &RawAddress,
) -> rusqlite::Result<String> {
  if let Some(place_id) = address.google_place_id.as_deref() {
    let existing: Option<String> = conn
      .query_row(
        "SELECT id FROM addresses WHERE google_place_id = ?1",
        rusqlite::params![place_id],
        |r| r.get(0),
      )
      .optional()?;
    if let Some(id) = existing {
      return Ok(id);
    }
  }

  conn.execute(
    &format!(
      "INSERT INTO addresses ({ADDRESS_COLUMNS})
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
    ),
    rusqlite::params![
      address.id,
      address.google_place_id,
      address.formatted_description,
      address.street_number,
      address.route,
      address.subpremise,
      address.locality,
      address.administrative_area_level_1,
      address.administrative_area_level_2,
      address.postal_code,
      address.postal_code_suffix,
      address.country_code,
      address.created_at,
    ],
  )?;
  Ok(address.id.clone())
}

fn insert_email_address(
  conn: &rusqlite::Connection,
  email: &RawEmailAddress,
) -> rusqlite::Result<()> {
  conn.execute(
    &format!(
      "INSERT INTO user_email_addresses ({EMAIL_COLUMNS})
       VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
    ),
    rusqlite::params![
      email.id,
      email.user_id,
      email.email_address,
      email.is_verified,
      email.source,
      email.created_at,
    ],
  )?;
  Ok(())
}

/// `column` is always one of the literals in [`UserStore::update_user`].
fn set_user_column(
  conn: &rusqlite::Connection,
  user_id: &str,
  column: &'static str,
  value: &dyn ToSql,
) -> rusqlite::Result<()> {
  conn.execute(
    &format!("UPDATE users SET {column} = ?2 WHERE id = ?1"),
    rusqlite::params![user_id, value],
  )?;
  Ok(())
}

// ─── UserStore impl ──────────────────────────────────────────────────────────

impl UserStore for SqliteStore {
  type Error = Error;

  // ── Lookups ───────────────────────────────────────────────────────────────

  async fn find_opt_in_action(
    &self,
    action_type: ActionType,
    opt_in_type: Option<OptInType>,
    email_address: &str,
  ) -> Result<Option<ExistingAction>> {
    let action_type = action_type.discriminant();
    let opt_in_type = opt_in_type.map(OptInType::discriminant);
    let email       = email_address.to_owned();

    let raw: Option<(RawAction, RawUserRecord)> = self
      .conn
      .call(move |conn| {
        let action = conn
          .query_row(
            &format!(
              "SELECT {ACTION_COLUMNS} FROM user_actions a
               WHERE a.action_type = ?1
                 AND a.opt_in_type IS ?2
                 AND EXISTS (
                   SELECT 1 FROM user_email_addresses e
                   WHERE e.user_id = a.user_id AND e.email_address = ?3
                 )
               ORDER BY a.rowid
               LIMIT 1"
            ),
            rusqlite::params![action_type, opt_in_type, email],
            RawAction::from_row,
          )
          .optional()?;

        let Some(action) = action else {
          return Ok(None);
        };
        let user = load_user_record(conn, &action.user_id)?;
        Ok(user.map(|user| (action, user)))
      })
      .await?;

    raw
      .map(|(action, user)| -> Result<ExistingAction> {
        Ok(ExistingAction {
          action: action.into_action()?,
          user:   user.into_record()?,
        })
      })
      .transpose()
  }

  async fn find_user_by_email(
    &self,
    email_address: &str,
  ) -> Result<Option<UserRecord>> {
    let email = email_address.to_owned();

    let raw: Option<RawUserRecord> = self
      .conn
      .call(move |conn| {
        let user_id: Option<String> = conn
          .query_row(
            "SELECT user_id FROM user_email_addresses
             WHERE email_address = ?1
             ORDER BY rowid
             LIMIT 1",
            rusqlite::params![email],
            |r| r.get(0),
          )
          .optional()?;

        match user_id {
          Some(id) => Ok(load_user_record(conn, &id)?),
          None => Ok(None),
        }
      })
      .await?;

    raw.map(RawUserRecord::into_record).transpose()
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<UserRecord>> {
    let id_str = encode_uuid(id);

    let raw = self
      .conn
      .call(move |conn| Ok(load_user_record(conn, &id_str)?))
      .await?;

    raw.map(RawUserRecord::into_record).transpose()
  }

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn create_user(&self, input: NewUser) -> Result<UserRecord> {
    let NewUser {
      attribution,
      referral_id,
      information_visibility,
      first_name,
      last_name,
      phone_number,
      has_opted_in_to_emails,
      has_opted_in_to_sms,
      has_opted_in_to_membership,
      email_address,
      address,
    } = input;

    let now        = Utc::now();
    let user_id    = Uuid::new_v4();
    let id_str     = encode_uuid(user_id);
    let at_str     = encode_dt(now);
    let session_id = encode_uuid(Uuid::new_v4());
    let visibility = information_visibility.discriminant();
    let email      = RawEmailAddress::new(Uuid::new_v4(), user_id, &email_address, now);
    let address    = address.map(|a| RawAddress::new(Uuid::new_v4(), a, now));

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let address_id = address
          .as_ref()
          .map(|a| connect_or_create_address(&tx, a))
          .transpose()?;

        tx.execute(
          &format!(
            "INSERT INTO users ({USER_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                     ?11, ?12, ?13, ?14, NULL, ?15)"
          ),
          rusqlite::params![
            id_str,
            at_str,
            first_name,
            last_name,
            phone_number,
            has_opted_in_to_emails,
            has_opted_in_to_sms,
            has_opted_in_to_membership,
            visibility,
            referral_id,
            attribution.source,
            attribution.medium,
            attribution.campaign,
            attribution.referer,
            address_id,
          ],
        )?;

        insert_email_address(&tx, &email)?;

        tx.execute(
          &format!(
            "INSERT INTO user_sessions ({SESSION_COLUMNS}) VALUES (?1, ?2, ?3)"
          ),
          rusqlite::params![session_id, id_str, at_str],
        )?;

        let record = load_user_record(&tx, &id_str)?;
        tx.commit()?;
        Ok(record)
      })
      .await?;

    raw
      .ok_or(Error::UserNotFound(user_id))?
      .into_record()
  }

  async fn update_user(&self, id: Uuid, patch: &UserPatch) -> Result<UserRecord> {
    let now     = Utc::now();
    let id_str  = encode_uuid(id);
    let patch   = patch.clone();
    let email   = patch
      .new_email_address
      .as_ref()
      .map(|e| RawEmailAddress::new(Uuid::new_v4(), id, e, now));
    let verify  = patch.verify_email_address_id.map(encode_uuid);
    let address = patch
      .address
      .clone()
      .map(|a| RawAddress::new(Uuid::new_v4(), a, now));

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let exists = tx
          .query_row(
            "SELECT 1 FROM users WHERE id = ?1",
            rusqlite::params![id_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !exists {
          return Ok(None);
        }

        if let Some(v) = &patch.first_name {
          set_user_column(&tx, &id_str, "first_name", v)?;
        }
        if let Some(v) = &patch.last_name {
          set_user_column(&tx, &id_str, "last_name", v)?;
        }
        if let Some(v) = &patch.phone_number {
          set_user_column(&tx, &id_str, "phone_number", v)?;
        }
        if let Some(v) = &patch.has_opted_in_to_emails {
          set_user_column(&tx, &id_str, "has_opted_in_to_emails", v)?;
        }
        if let Some(v) = &patch.has_opted_in_to_sms {
          set_user_column(&tx, &id_str, "has_opted_in_to_sms", v)?;
        }
        if let Some(v) = &patch.has_opted_in_to_membership {
          set_user_column(&tx, &id_str, "has_opted_in_to_membership", v)?;
        }

        if let Some(email) = &email {
          insert_email_address(&tx, email)?;
        }

        if let Some(email_id) = &verify {
          tx.execute(
            "UPDATE user_email_addresses SET is_verified = 1
             WHERE id = ?1 AND user_id = ?2",
            rusqlite::params![email_id, id_str],
          )?;
        }

        if let Some(address) = &address {
          let address_id = connect_or_create_address(&tx, address)?;
          set_user_column(&tx, &id_str, "address_id", &address_id)?;
        }

        let record = load_user_record(&tx, &id_str)?;
        tx.commit()?;
        Ok(record)
      })
      .await?;

    raw.ok_or(Error::UserNotFound(id))?.into_record()
  }

  async fn set_primary_email(
    &self,
    user_id: Uuid,
    email_address_id: Uuid,
  ) -> Result<()> {
    let user_str  = encode_uuid(user_id);
    let email_str = encode_uuid(email_address_id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE users SET primary_user_email_address_id = ?2
           WHERE id = ?1
             AND EXISTS (
               SELECT 1 FROM user_email_addresses
               WHERE id = ?2 AND user_id = ?1
             )",
          rusqlite::params![user_str, email_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::ForeignEmailAddress { user_id, email_address_id });
    }
    Ok(())
  }

  // ── Actions & sessions ────────────────────────────────────────────────────

  async fn create_action(&self, input: NewUserAction) -> Result<UserAction> {
    let action = UserAction {
      id:            Uuid::new_v4(),
      user_id:       input.user_id,
      action_type:   input.action_type,
      opt_in_type:   input.opt_in_type,
      campaign_name: input.campaign_name,
      created_at:    Utc::now(),
    };

    let id_str        = encode_uuid(action.id);
    let user_str      = encode_uuid(action.user_id);
    let action_type   = action.action_type.discriminant();
    let opt_in_type   = action.opt_in_type.map(OptInType::discriminant);
    let campaign_name = action.campaign_name.clone();
    let at_str        = encode_dt(action.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO user_actions ({ACTION_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
          ),
          rusqlite::params![
            id_str,
            user_str,
            action_type,
            opt_in_type,
            campaign_name,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(action)
  }

  async fn list_actions(&self, user_id: Uuid) -> Result<Vec<UserAction>> {
    let user_str = encode_uuid(user_id);

    let raws: Vec<RawAction> = self
      .conn
      .call(move |conn| {
        let rows = conn
          .prepare(&format!(
            "SELECT {ACTION_COLUMNS} FROM user_actions
             WHERE user_id = ?1 ORDER BY rowid"
          ))?
          .query_map(rusqlite::params![user_str], RawAction::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAction::into_action).collect()
  }

  async fn create_session(&self, user_id: Uuid) -> Result<UserSession> {
    let session = UserSession {
      id: Uuid::new_v4(),
      user_id,
      created_at: Utc::now(),
    };

    let id_str   = encode_uuid(session.id);
    let user_str = encode_uuid(user_id);
    let at_str   = encode_dt(session.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO user_sessions ({SESSION_COLUMNS}) VALUES (?1, ?2, ?3)"
          ),
          rusqlite::params![id_str, user_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(session)
  }
}
