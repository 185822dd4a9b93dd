use chrono::{NaiveDate, NaiveDateTime};
use chumsky::error::Rich;
use chumsky::extra;
use chumsky::prelude::*;

type Error<'a> = extra::Err<Rich<'a, char>>;

const SEPARATOR: char = '_';
const PADDING: char = '-';
const DATE_LEN: usize = 8;
const DATETIME_LEN: usize = 15;

/// The fields of a Yeoda file name. `None` marks an empty or padded field.
#[derive(Default, Debug, Clone, Eq, PartialEq)]
pub struct YeodaFilename {
    pub var_name: Option<String>,
    pub datetime_1: Option<NaiveDateTime>,
    pub datetime_2: Option<NaiveDateTime>,
    pub band: Option<String>,
    pub extra_field: Option<String>,
    pub tile_name: Option<String>,
    pub grid_name: Option<String>,
    pub data_version: Option<String>,
    pub sensor_field: Option<String>,
    pub creator: Option<String>,
}

/// Parses a file stem (no extension).
pub fn filename<'a>() -> impl Parser<'a, &'a str, YeodaFilename, Error<'a>> {
    text()
        .then_ignore(just(SEPARATOR))
        .then(datetime())
        .then_ignore(just(SEPARATOR))
        .then(datetime())
        .then_ignore(just(SEPARATOR))
        .then(text().separated_by(just(SEPARATOR)).collect::<Vec<_>>())
        .then_ignore(end())
        .try_map(|(((var_name, datetime_1), datetime_2), rest), span| {
            // band, extra_field, tile_name, grid_name, data_version, sensor_field[, creator]
            if rest.len() != 6 && rest.len() != 7 {
                return Err(Rich::custom(
                    span,
                    format!("expected 9 or 10 fields but found {}", rest.len() + 3),
                ));
            }
            let mut rest = rest.into_iter();
            let mut next = || rest.next().flatten();
            Ok(YeodaFilename {
                var_name,
                datetime_1,
                datetime_2,
                band: next(),
                extra_field: next(),
                tile_name: next(),
                grid_name: next(),
                data_version: next(),
                sensor_field: next(),
                creator: next(),
            })
        })
}

fn raw_field<'a>() -> impl Parser<'a, &'a str, &'a str, Error<'a>> + Clone {
    none_of(SEPARATOR).repeated().slice()
}

fn text<'a>() -> impl Parser<'a, &'a str, Option<String>, Error<'a>> + Clone {
    raw_field().map(|s: &str| (!is_padding(s)).then(|| s.to_string()))
}

fn datetime<'a>() -> impl Parser<'a, &'a str, Option<NaiveDateTime>, Error<'a>> + Clone {
    raw_field().try_map(|s: &str, span| {
        if is_padding(s) {
            return Ok(None);
        }
        parse_datetime(s)
            .map(Some)
            .ok_or_else(|| Rich::custom(span, format!("'{}' is not YYYYMMDD[THHMMSS]", s)))
    })
}

fn is_padding(s: &str) -> bool {
    s.chars().all(|c| c == PADDING)
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    if !s.chars().all(|c| c.is_ascii_digit() || c == 'T') {
        return None;
    }
    match s.len() {
        DATE_LEN => NaiveDate::parse_from_str(s, "%Y%m%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0)),
        DATETIME_LEN => NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%S").ok(),
        _ => None,
    }
}
