use chrono::Local;
use failure::{bail, Error};
use rusqlite::types::ToSql;
use rusqlite::{Connection, NO_PARAMS};

const TOKEN_KEY: &str = "token";

/// Local persistence for the session token.
pub struct TokenStore {
    conn: Connection,
}

impl TokenStore {
    pub fn open(path: &str) -> Result<TokenStore, Error> {
        let conn = Connection::open(path)?;
        TokenStore::initialize(conn)
    }

    pub fn in_memory() -> Result<TokenStore, Error> {
        let conn = Connection::open_in_memory()?;
        TokenStore::initialize(conn)
    }

    fn initialize(conn: Connection) -> Result<TokenStore, Error> {
        conn.execute(
            "create table if not exists session (
                key text primary key,
                value text not null,
                updated datetime
             )",
            NO_PARAMS,
        )?;
        Ok(TokenStore { conn })
    }

    pub fn load(&self) -> Result<Option<String>, Error> {
        let mut stmt = self.conn.prepare("select value from session where key = ?")?;
        let token = match stmt.query_row(&[&TOKEN_KEY as &dyn ToSql], |r| -> String { r.get(0) }) {
            Ok(value) => Some(value),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => bail!(e),
        };
        Ok(token)
    }

    pub fn save(&self, token: &str) -> Result<(), Error> {
        let now = Local::now();
        self.conn.execute(
            "insert or replace into session (key, value, updated) values (?1, ?2, ?3)",
            &[&TOKEN_KEY as &dyn ToSql, &token, &now.to_string()],
        )?;
        Ok(())
    }

    pub fn clear(&self) -> Result<(), Error> {
        self.conn
            .execute("delete from session where key = ?1", &[&TOKEN_KEY as &dyn ToSql])?;
        Ok(())
    }
}
