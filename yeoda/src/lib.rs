use std::path::Path;

use anyhow::Result;
use chumsky::Parser;
use itertools::Itertools;
use log::debug;

use layertree::catalog::{Fields, Value};
use layertree::error::Error;

pub use parser::YeodaFilename;

mod parser;

/// [layertree::Decoder] for the Yeoda file naming convention:
///
/// `var_name_datetime1_datetime2_band_extrafield_tile_grid_dataversion_sensor[_creator].ext`
///
/// Datetimes are `YYYYMMDD` or `YYYYMMDDTHHMMSS`. Empty fields and fields consisting only of
/// `-` padding decode to [Value::Null].
#[derive(Default, Debug, Clone, Copy)]
pub struct Yeoda;

impl Yeoda {
    pub fn parse(&self, file_name: &str) -> Result<YeodaFilename> {
        let stem = Path::new(file_name)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(file_name);
        debug!("decoding '{}'", stem);
        parser::filename()
            .parse(stem)
            .into_result()
            .map_err(|errs| {
                Error::Decode {
                    file_name: file_name.to_string(),
                    reason: errs.iter().map(|e| e.to_string()).join("; "),
                }
                .into()
            })
    }
}

impl layertree::Decoder for Yeoda {
    fn decode(&self, file_name: &str) -> Result<Fields> {
        Ok(self.parse(file_name)?.into_fields())
    }
}

impl YeodaFilename {
    /// All fields by name. Absent fields are present as [Value::Null].
    pub fn into_fields(self) -> Fields {
        let text = |s: Option<String>| s.map(Value::Str).unwrap_or_default();
        Fields::from([
            ("var_name".to_string(), text(self.var_name)),
            ("datetime_1".to_string(), Value::from(self.datetime_1)),
            ("datetime_2".to_string(), Value::from(self.datetime_2)),
            ("band".to_string(), text(self.band)),
            ("extra_field".to_string(), text(self.extra_field)),
            ("tile_name".to_string(), text(self.tile_name)),
            ("grid_name".to_string(), text(self.grid_name)),
            ("data_version".to_string(), text(self.data_version)),
            ("sensor_field".to_string(), text(self.sensor_field)),
            ("creator".to_string(), text(self.creator)),
        ])
    }
}

#[cfg(test)]
mod tests {
    mod decode {
        use anyhow::Result;
        use chrono::NaiveDate;

        use layertree::catalog::Value;
        use layertree::error::Error;
        use layertree::Decoder;

        use crate::Yeoda;

        #[test]
        fn full_name() -> Result<()> {
            let fields =
                Yeoda.decode("SIG0_20170725T165004__VV_A146_E048N012T6_EU500M_V1M0_S1AIWGRDH_TUWIEN.tif")?;
            assert_eq!(fields.len(), 10);
            assert_eq!(fields["var_name"], Value::from("SIG0"));
            assert_eq!(
                fields["datetime_1"],
                Value::DateTime(
                    NaiveDate::from_ymd_opt(2017, 7, 25)
                        .unwrap()
                        .and_hms_opt(16, 50, 4)
                        .unwrap()
                )
            );
            assert_eq!(fields["datetime_2"], Value::Null);
            assert_eq!(fields["band"], Value::from("VV"));
            assert_eq!(fields["extra_field"], Value::from("A146"));
            assert_eq!(fields["tile_name"], Value::from("E048N012T6"));
            assert_eq!(fields["grid_name"], Value::from("EU500M"));
            assert_eq!(fields["data_version"], Value::from("V1M0"));
            assert_eq!(fields["sensor_field"], Value::from("S1AIWGRDH"));
            assert_eq!(fields["creator"], Value::from("TUWIEN"));
            Ok(())
        }

        #[test]
        fn without_creator() -> Result<()> {
            let fields = Yeoda.decode("SSM_20210615__---_-_E048N012T6_EU500M_V1M0_S1.tif")?;
            assert_eq!(
                fields["datetime_1"],
                Value::DateTime(
                    NaiveDate::from_ymd_opt(2021, 6, 15)
                        .unwrap()
                        .and_hms_opt(0, 0, 0)
                        .unwrap()
                )
            );
            assert_eq!(fields["band"], Value::Null);
            assert_eq!(fields["extra_field"], Value::Null);
            assert_eq!(fields["creator"], Value::Null);
            Ok(())
        }

        #[test]
        fn wrong_field_count_errors() {
            for name in [
                "SIG0_20170725T165004__VV.tif",
                "SIG0_20170725T165004__VV_A146_E048N012T6_EU500M_V1M0_S1AIWGRDH_TUWIEN_X.tif",
            ] {
                let err = Yeoda.decode(name).unwrap_err();
                assert!(matches!(
                    err.downcast_ref::<Error>(),
                    Some(Error::Decode { file_name, .. }) if file_name == name
                ));
            }
        }

        #[test]
        fn bad_datetime_errors() {
            for name in [
                "SIG0_2017072_20170726_VV_A146_E048N012T6_EU500M_V1M0_S1AIWGRDH.tif",
                "SIG0_20171325__VV_A146_E048N012T6_EU500M_V1M0_S1AIWGRDH.tif",
                "SIG0_20170725T1650__VV_A146_E048N012T6_EU500M_V1M0_S1AIWGRDH.tif",
            ] {
                assert!(Yeoda.decode(name).is_err(), "{}", name);
            }
        }
    }
}
