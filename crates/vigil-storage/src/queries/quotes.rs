// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only daily-quote history.

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use vigil_core::{DailyQuote, NewDailyQuote, QuoteChannel, UserId, VigilError};

use crate::database::{Database, format_ts, parse_ts, ts_column};

fn channel_from_sql(raw: &str, idx: usize) -> rusqlite::Result<QuoteChannel> {
    raw.parse().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("unknown quote channel `{raw}`").into(),
        )
    })
}

fn latest_on(
    conn: &Connection,
    user: &str,
    channel: &str,
) -> rusqlite::Result<Option<DailyQuote>> {
    conn.query_row(
        "SELECT id, user_id, quote, timestamp, channel, is_favorite
         FROM daily_quotes
         WHERE user_id = ?1 AND channel = ?2
         ORDER BY timestamp DESC, rowid DESC
         LIMIT 1",
        params![user, channel],
        |row| {
            let channel: String = row.get(4)?;
            Ok(DailyQuote {
                id: row.get(0)?,
                user_id: UserId(row.get(1)?),
                quote: row.get(2)?,
                timestamp: ts_column(row, 3)?,
                channel: channel_from_sql(&channel, 4)?,
                is_favorite: row.get(5)?,
            })
        },
    )
    .optional()
}

fn insert(conn: &Connection, user: &str, quote: &NewDailyQuote) -> rusqlite::Result<DailyQuote> {
    let id = uuid::Uuid::new_v4().simple().to_string();
    conn.execute(
        "INSERT INTO daily_quotes (id, user_id, quote, timestamp, channel, is_favorite)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            id,
            user,
            quote.quote,
            format_ts(quote.timestamp),
            quote.channel.to_string(),
            quote.is_favorite,
        ],
    )?;
    Ok(DailyQuote {
        id,
        user_id: UserId(user.to_string()),
        quote: quote.quote.clone(),
        timestamp: parse_ts(&format_ts(quote.timestamp)).unwrap_or(quote.timestamp),
        channel: quote.channel,
        is_favorite: quote.is_favorite,
    })
}

pub async fn latest_quote(
    db: &Database,
    user: &UserId,
    channel: QuoteChannel,
) -> Result<Option<DailyQuote>, VigilError> {
    let user = user.0.clone();
    let channel = channel.to_string();
    db.connection()
        .call(move |conn| latest_on(conn, &user, &channel))
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn append_quote(
    db: &Database,
    user: &UserId,
    quote: &NewDailyQuote,
) -> Result<DailyQuote, VigilError> {
    let user = user.0.clone();
    let quote = quote.clone();
    db.connection()
        .call(move |conn| insert(conn, &user, &quote))
        .await
        .map_err(crate::database::map_tr_err)
}

/// Conditional insert: skips when the latest entry on the channel was sent on `day`.
/// Runs under an IMMEDIATE transaction so the check and insert cannot interleave
/// with another writer.
pub async fn append_quote_if_not_sent_on(
    db: &Database,
    user: &UserId,
    quote: &NewDailyQuote,
    day: NaiveDate,
) -> Result<Option<DailyQuote>, VigilError> {
    let user = user.0.clone();
    let quote = quote.clone();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let latest = latest_on(&tx, &user, &quote.channel.to_string())?;
            if latest.is_some_and(|q| q.sent_on(day)) {
                tx.commit()?;
                return Ok(None);
            }
            let inserted = insert(&tx, &user, &quote)?;
            tx.commit()?;
            Ok(Some(inserted))
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn at(day: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, day, h, 0, 0).unwrap()
    }

    fn quote(text: &str, ts: DateTime<Utc>, channel: QuoteChannel) -> NewDailyQuote {
        NewDailyQuote {
            quote: text.into(),
            timestamp: ts,
            channel,
            is_favorite: false,
        }
    }

    #[tokio::test]
    async fn latest_quote_is_per_channel() {
        let (db, _dir) = setup_db().await;
        let u = UserId::from("u1");
        append_quote(&db, &u, &quote("n1", at(1, 8), QuoteChannel::Notification)).await.unwrap();
        append_quote(&db, &u, &quote("n2", at(2, 8), QuoteChannel::Notification)).await.unwrap();
        append_quote(&db, &u, &quote("app", at(3, 8), QuoteChannel::InApp)).await.unwrap();

        let latest = latest_quote(&db, &u, QuoteChannel::Notification).await.unwrap().unwrap();
        assert_eq!(latest.quote, "n2");
        assert_eq!(latest.timestamp, at(2, 8));
    }

    #[tokio::test]
    async fn conditional_append_skips_same_day() {
        let (db, _dir) = setup_db().await;
        let u = UserId::from("u1");
        let day = NaiveDate::from_ymd_opt(2026, 4, 2).unwrap();

        let first = append_quote_if_not_sent_on(
            &db,
            &u,
            &quote("a", at(2, 8), QuoteChannel::Notification),
            day,
        )
        .await
        .unwrap();
        assert!(first.is_some());

        let second = append_quote_if_not_sent_on(
            &db,
            &u,
            &quote("b", at(2, 9), QuoteChannel::Notification),
            day,
        )
        .await
        .unwrap();
        assert!(second.is_none());

        let next_day = NaiveDate::from_ymd_opt(2026, 4, 3).unwrap();
        let third = append_quote_if_not_sent_on(
            &db,
            &u,
            &quote("c", at(3, 8), QuoteChannel::Notification),
            next_day,
        )
        .await
        .unwrap();
        assert!(third.is_some());
    }

    #[tokio::test]
    async fn concurrent_conditional_appends_insert_once() {
        let (db, _dir) = setup_db().await;
        let u = UserId::from("u1");
        let day = NaiveDate::from_ymd_opt(2026, 4, 2).unwrap();
        let q = quote("x", at(2, 8), QuoteChannel::Notification);

        let (a, b) = tokio::join!(
            append_quote_if_not_sent_on(&db, &u, &q, day),
            append_quote_if_not_sent_on(&db, &u, &q, day),
        );
        let inserted = [a.unwrap(), b.unwrap()].iter().filter(|r| r.is_some()).count();
        assert_eq!(inserted, 1);
    }
}
