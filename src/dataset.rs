use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;

use crate::config::DatasetConfig;

/// 組み込みの年平均気温データ（℃、1979〜2023）
///
/// 地表平均気温の年次系列。設定でJSONファイルを指定すると上書きされる。
const BUILTIN_TEMPERATURES: &[(i32, f32)] = &[
    (1979, 14.17),
    (1980, 14.26),
    (1981, 14.32),
    (1982, 14.14),
    (1983, 14.31),
    (1984, 14.16),
    (1985, 14.12),
    (1986, 14.18),
    (1987, 14.32),
    (1988, 14.39),
    (1989, 14.27),
    (1990, 14.45),
    (1991, 14.40),
    (1992, 14.22),
    (1993, 14.23),
    (1994, 14.31),
    (1995, 14.45),
    (1996, 14.33),
    (1997, 14.46),
    (1998, 14.61),
    (1999, 14.38),
    (2000, 14.39),
    (2001, 14.53),
    (2002, 14.63),
    (2003, 14.61),
    (2004, 14.53),
    (2005, 14.67),
    (2006, 14.63),
    (2007, 14.66),
    (2008, 14.54),
    (2009, 14.65),
    (2010, 14.72),
    (2011, 14.61),
    (2012, 14.65),
    (2013, 14.68),
    (2014, 14.74),
    (2015, 14.90),
    (2016, 15.01),
    (2017, 14.92),
    (2018, 14.85),
    (2019, 14.98),
    (2020, 15.01),
    (2021, 14.85),
    (2022, 14.89),
    (2023, 15.17),
];

#[derive(Debug, Deserialize)]
struct DatasetFile {
    data: BTreeMap<String, f32>,
}

/// 年→気温の読み取り専用テーブルと、巡回する「現在の年」カーソル
///
/// カーソルは衝突の立ち上がりごとに1年進み、末尾を超えたら
/// 先頭へ巻き戻る。範囲外アクセスは失敗ではなく巻き戻しで定義される。
pub struct TemperatureTable {
    data: BTreeMap<i32, f32>,
    start_year: i32,
    end_year: i32,
    current: i32,
}

impl TemperatureTable {
    /// 組み込みデータでテーブルを作る
    pub fn builtin(start_year: i32, end_year: i32) -> Self {
        let data = BUILTIN_TEMPERATURES.iter().copied().collect();
        Self {
            data,
            start_year,
            end_year,
            current: start_year,
        }
    }

    /// 設定からテーブルを作る。pathがあればJSONを読み込む。
    pub fn from_config(config: &DatasetConfig) -> Result<Self> {
        match &config.path {
            Some(path) => Self::load(path, config.start_year, config.end_year),
            None => Ok(Self::builtin(config.start_year, config.end_year)),
        }
    }

    /// JSONファイル（{"data": {"1979": 14.17, ...}}）から読み込む
    pub fn load(path: &str, start_year: i32, end_year: i32) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read dataset file")?;
        let file: DatasetFile = serde_json::from_str(&content)?;

        let mut data = BTreeMap::new();
        for (year, temp) in file.data {
            let year: i32 = year
                .parse()
                .with_context(|| format!("Invalid year key: {}", year))?;
            data.insert(year, temp);
        }

        Ok(Self {
            data,
            start_year,
            end_year,
            current: start_year,
        })
    }

    /// 現在の年
    pub fn current_year(&self) -> i32 {
        self.current
    }

    /// 現在の年の気温。テーブルに欠けている年は0.0。
    pub fn current_temperature(&self) -> f32 {
        self.data.get(&self.current).copied().unwrap_or_default()
    }

    /// カーソルを1年進める（末尾を超えたら先頭へ巻き戻し）
    ///
    /// 戻り値: 新しい (年, 気温)
    pub fn advance(&mut self) -> (i32, f32) {
        self.current += 1;
        if self.current > self.end_year {
            self.current = self.start_year;
        }
        (self.current, self.current_temperature())
    }
}
