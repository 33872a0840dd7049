//! Synthesis Adapter - 远程语音合成客户端实现

mod elevenlabs_client;
mod fake_synthesizer;

pub use elevenlabs_client::{ElevenLabsClient, ElevenLabsClientConfig};
pub use fake_synthesizer::{FakeSpeechSynthesizer, SynthesisCall};
