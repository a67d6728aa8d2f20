//! UI strings served to clients

use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Locale {
    pub hello_assistant: &'static str,
    pub reset_chat: &'static str,
    pub choose_audiofile: &'static str,
    pub synthesize: &'static str,
    pub record_audio: &'static str,
    pub start_chat: &'static str,
}

const EN: Locale = Locale {
    hello_assistant: "Hello, I am your personal assistant. How can I help you?",
    reset_chat: "Reset chat",
    choose_audiofile: "Choose an audio file",
    synthesize: "Synthesize sound",
    record_audio: "Record audio",
    start_chat: "Start chat",
};

const UK: Locale = Locale {
    hello_assistant: "Привіт, я твій персональний асистент. Як я можу тобі допомогти?",
    reset_chat: "Очистити чат",
    choose_audiofile: "Оберіть аудіофайл",
    synthesize: "Синтезувати звук",
    record_audio: "Записати аудіо",
    start_chat: "Почати чат",
};

pub fn locale(language: &str) -> Option<&'static Locale> {
    match language {
        "en" => Some(&EN),
        "uk" => Some(&UK),
        _ => None,
    }
}
