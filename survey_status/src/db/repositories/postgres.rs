//! Live exposure queries against the observatory PostgreSQL database.

use chrono::NaiveTime;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{Double, Nullable, Text, Timestamp};
use log::{debug, info};

use crate::db::query::ExposureQuery;
use crate::db::repository::{ExposureSource, RepositoryError, RepositoryResult};
use crate::models::time::parse_timestamp;
use crate::models::Exposure;

/// Connection settings read from the environment.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub database_url: String,
}

impl PostgresConfig {
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;
        Ok(Self { database_url })
    }
}

#[derive(QueryableByName, Debug)]
struct ExposureRow {
    #[diesel(sql_type = Text)]
    object: String,
    #[diesel(sql_type = Nullable<Double>)]
    ra: Option<f64>,
    #[diesel(sql_type = Nullable<Double>)]
    dec: Option<f64>,
    #[diesel(sql_type = Double)]
    exptime: f64,
    #[diesel(sql_type = Text)]
    filter: String,
    #[diesel(sql_type = Text)]
    date: String,
    #[diesel(sql_type = Text)]
    program: String,
    #[diesel(sql_type = Double)]
    qc_teff: f64,
    #[diesel(sql_type = Double)]
    qc_fwhm: f64,
}

impl ExposureRow {
    fn into_exposure(self, row: usize) -> RepositoryResult<Exposure> {
        let date = parse_timestamp(&self.date).ok_or_else(|| {
            RepositoryError::InvalidRow {
                row,
                message: format!("unparseable date '{}'", self.date),
            }
        })?;
        Ok(Exposure {
            object: self.object,
            program: self.program,
            filter: self.filter,
            exptime: self.exptime,
            date,
            qc_teff: self.qc_teff,
            qc_fwhm: self.qc_fwhm,
            ra: self.ra,
            dec: self.dec,
        })
    }
}

/// Diesel-backed exposure source. A connection is opened per query; the
/// tool runs a single query per invocation.
#[derive(Debug, Clone)]
pub struct PostgresRepository {
    config: PostgresConfig,
}

impl PostgresRepository {
    pub fn new(config: PostgresConfig) -> Self {
        Self { config }
    }

    pub fn from_env() -> RepositoryResult<Self> {
        PostgresConfig::from_env()
            .map(Self::new)
            .map_err(RepositoryError::Unconfigured)
    }

    fn connect(&self) -> RepositoryResult<PgConnection> {
        PgConnection::establish(&self.config.database_url)
            .map_err(|e| RepositoryError::Connection(e.to_string()))
    }
}

impl ExposureSource for PostgresRepository {
    fn fetch_exposures(&self, query: &ExposureQuery) -> RepositoryResult<Vec<Exposure>> {
        let mut conn = self.connect()?;
        debug!("Running exposure query: {}", query.sql());

        let rows: Vec<ExposureRow> = sql_query(query.sql())
            .bind::<Text, _>(query.propid.clone())
            .bind::<Double, _>(query.min_exptime)
            .bind::<Text, _>(query.object_pattern())
            .bind::<Timestamp, _>(query.start.and_time(NaiveTime::MIN))
            .bind::<Timestamp, _>(query.end.and_time(NaiveTime::MIN))
            .load(&mut conn)
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        info!("Exposure query returned {} rows", rows.len());
        rows.into_iter()
            .enumerate()
            .map(|(i, row)| row.into_exposure(i))
            .collect()
    }

    fn describe(&self) -> String {
        "observatory PostgreSQL database".to_string()
    }
}
