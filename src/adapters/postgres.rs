use crate::domain::{GameLog, GameOutcome, HomeAway, StatLine};
use crate::error::Result;
use chrono::NaiveDate;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::Row;
use tracing::{debug, info, instrument};

/// PostgreSQL storage adapter
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        info!("Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Run migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations completed");
        Ok(())
    }

    // ==================== Game logs ====================

    /// Insert or overwrite the record for `(player_key, game_date)`
    #[instrument(skip(self, log), fields(player = %log.player_key, date = %log.game_date))]
    pub async fn upsert_game_log(&self, log: &GameLog) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO player_game_logs
                (player_key, player_name, game_date, stats, minutes_played,
                 opponent, home_away, game_result)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (player_key, game_date) DO UPDATE SET
                player_name = EXCLUDED.player_name,
                stats = EXCLUDED.stats,
                minutes_played = EXCLUDED.minutes_played,
                opponent = EXCLUDED.opponent,
                home_away = EXCLUDED.home_away,
                game_result = EXCLUDED.game_result,
                updated_at = NOW()
            "#,
        )
        .bind(&log.player_key)
        .bind(&log.player_name)
        .bind(log.game_date)
        .bind(Json(&log.stats))
        .bind(log.minutes_played)
        .bind(log.opponent.as_deref())
        .bind(log.home_away.map(|h| h.as_str()))
        .bind(log.game_result.map(|r| r.as_str()))
        .execute(&self.pool)
        .await?;

        debug!("Upserted game log");
        Ok(())
    }

    /// Which of `dates` have a stored record for this player
    pub async fn get_game_dates(
        &self,
        player_key: &str,
        dates: &[NaiveDate],
    ) -> Result<Vec<NaiveDate>> {
        if dates.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            r#"
            SELECT game_date FROM player_game_logs
            WHERE player_key = $1 AND game_date = ANY($2)
            "#,
        )
        .bind(player_key)
        .bind(dates.to_vec())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(|r| r.get("game_date")).collect())
    }

    /// Stored dates for this player inside `[start, end]`
    pub async fn get_game_dates_between(
        &self,
        player_key: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NaiveDate>> {
        let rows = sqlx::query(
            r#"
            SELECT game_date FROM player_game_logs
            WHERE player_key = $1 AND game_date BETWEEN $2 AND $3
            ORDER BY game_date
            "#,
        )
        .bind(player_key)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(|r| r.get("game_date")).collect())
    }

    /// Stored records for this player on the given dates, newest first
    pub async fn get_game_logs(
        &self,
        player_key: &str,
        dates: &[NaiveDate],
    ) -> Result<Vec<GameLog>> {
        if dates.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            r#"
            SELECT player_key, player_name, game_date, stats, minutes_played,
                   opponent, home_away, game_result
            FROM player_game_logs
            WHERE player_key = $1 AND game_date = ANY($2)
            ORDER BY game_date DESC
            "#,
        )
        .bind(player_key)
        .bind(dates.to_vec())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_game_log).collect())
    }
}

fn row_to_game_log(r: &PgRow) -> GameLog {
    GameLog {
        player_key: r.get("player_key"),
        player_name: r.get("player_name"),
        game_date: r.get("game_date"),
        stats: r.get::<Json<StatLine>, _>("stats").0,
        minutes_played: r.get("minutes_played"),
        opponent: r.get("opponent"),
        home_away: r
            .get::<Option<String>, _>("home_away")
            .and_then(|s| HomeAway::try_from(s.as_str()).ok()),
        game_result: r
            .get::<Option<String>, _>("game_result")
            .and_then(|s| GameOutcome::try_from(s.as_str()).ok()),
    }
}
