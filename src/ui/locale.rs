//! User-facing strings in English and Thai.

use serde::{Deserialize, Serialize};

use crate::detector::Notice;

/// Display language for the terminal UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Th,
}

/// Every string the UI prints, for one locale.
#[derive(Debug, Clone, Copy)]
pub struct Messages {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub loading: &'static str,
    pub placeholder: &'static str,
    pub start: &'static str,
    pub stop: &'static str,
    pub results: &'static str,
    pub model_load_failed: &'static str,
    pub camera_denied: &'static str,
    pub loop_halted: &'static str,
    pub hint: &'static str,
}

const EN: Messages = Messages {
    title: "Mask Detector",
    subtitle: "Face mask detection",
    loading: "Loading AI model...",
    placeholder: "Press the button below to start",
    start: "Start detection",
    stop: "Stop camera",
    results: "Results",
    model_load_failed: "Could not load the model. Please check the model files.",
    camera_denied: "Could not access the camera. Please allow camera access.",
    loop_halted: "Detection stopped unexpectedly. Start again to retry.",
    hint: "[space] start/stop  [q] quit",
};

const TH: Messages = Messages {
    title: "Mask Detector",
    subtitle: "ระบบตรวจจับหน้ากากอนามัย",
    loading: "กำลังโหลดโมเดล AI...",
    placeholder: "กดปุ่มด้านล่างเพื่อเริ่มต้น",
    start: "เริ่มตรวจจับ",
    stop: "หยุดกล้อง",
    results: "ผลการวิเคราะห์",
    model_load_failed: "ไม่สามารถโหลดโมเดลได้ กรุณาตรวจสอบไฟล์โมเดล",
    camera_denied: "ไม่สามารถเข้าถึงกล้องได้ กรุณาอนุญาตการใช้กล้อง",
    loop_halted: "การตรวจจับหยุดทำงาน กดเริ่มอีกครั้ง",
    hint: "[space] เริ่ม/หยุด  [q] ออก",
};

impl Locale {
    pub fn messages(self) -> &'static Messages {
        match self {
            Locale::En => &EN,
            Locale::Th => &TH,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Th => "th",
        }
    }
}

impl Messages {
    pub fn notice(&self, notice: Notice) -> &'static str {
        match notice {
            Notice::ModelLoad => self.model_load_failed,
            Notice::CameraAccess => self.camera_denied,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thai_notices() {
        let th = Locale::Th.messages();
        assert_eq!(
            th.notice(Notice::ModelLoad),
            "ไม่สามารถโหลดโมเดลได้ กรุณาตรวจสอบไฟล์โมเดล"
        );
        assert_eq!(
            th.notice(Notice::CameraAccess),
            "ไม่สามารถเข้าถึงกล้องได้ กรุณาอนุญาตการใช้กล้อง"
        );
    }

    #[test]
    fn test_locale_from_toml() {
        #[derive(Deserialize)]
        struct Wrap {
            locale: Locale,
        }
        let w: Wrap = toml::from_str(r#"locale = "th""#).unwrap();
        assert_eq!(w.locale, Locale::Th);
        assert_eq!(Locale::default().name(), "en");
    }
}
