/// データセット前進イベントを受け取る表示シンク
///
/// 書き込み専用。コアは年の前進ごとに1回だけ呼ぶ。
pub trait OverlaySink {
    fn push(&mut self, year: i32, temp: f32);
}

/// オーバーレイの表示文字列
pub fn format_overlay(year: i32, temp: f32) -> String {
    format!("Year: {} | Temp: {}°C", year, temp)
}

/// 標準出力へ表示するシンク
pub struct ConsoleOverlay;

impl OverlaySink for ConsoleOverlay {
    fn push(&mut self, year: i32, temp: f32) {
        println!("{}", format_overlay(year, temp));
    }
}

/// 受信内容を記録するシンク（テスト用）
#[derive(Default)]
pub struct RecordingOverlay {
    pub entries: Vec<(i32, f32)>,
}

impl OverlaySink for RecordingOverlay {
    fn push(&mut self, year: i32, temp: f32) {
        self.entries.push((year, temp));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_overlay() {
        assert_eq!(format_overlay(1988, 14.2), "Year: 1988 | Temp: 14.2°C");
    }

    #[test]
    fn test_recording_overlay() {
        let mut sink = RecordingOverlay::default();
        sink.push(1980, 14.09);
        sink.push(1981, 14.15);
        assert_eq!(sink.entries, vec![(1980, 14.09), (1981, 14.15)]);
    }
}
