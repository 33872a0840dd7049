//! Generate Command Handlers - 缓存感知的生成编排
//!
//! 流程: 校验 → KeyBuilding → CacheProbe → 命中: Ready
//!                                      → 未命中: Generating → Storing → Ready
//!
//! 缓存写入不在正确性路径上：写入在后台进行，失败只记录日志。

use std::sync::Arc;
use std::time::Duration;

use crate::application::commands::generate_commands::*;
use crate::application::error::ApplicationError;
use crate::application::ports::{
    AudioCachePort, AudioSource, GenerationState, GenerationTarget, PlaybackHandle, PlaybackPort,
    SessionManagerPort, SpeechSynthesisPort, SynthesisOptions,
};
use crate::domain::cache_key::{CacheKeyBuilder, DEFAULT_OUTPUT_FORMAT};
use crate::domain::dialogue::{DialogueTurn, LineRequest, ModelMode, FAST_MODEL_ID, FULL_MODEL_ID};
use crate::infrastructure::events::EventPublisher;

/// 生成配置
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub full_model_id: String,
    pub fast_model_id: String,
    pub output_format: String,
    /// 缓存命中后自动播放延迟
    pub cache_hit_delay: Duration,
    /// 新生成后自动播放延迟
    pub generated_delay: Duration,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            full_model_id: FULL_MODEL_ID.to_string(),
            fast_model_id: FAST_MODEL_ID.to_string(),
            output_format: DEFAULT_OUTPUT_FORMAT.to_string(),
            cache_hit_delay: Duration::from_millis(50),
            generated_delay: Duration::from_millis(100),
        }
    }
}

impl GenerationConfig {
    pub fn model_for(&self, mode: ModelMode) -> &str {
        if mode.is_fast() {
            &self.fast_model_id
        } else {
            &self.full_model_id
        }
    }
}

/// 已校验的生成输入
enum GenerationInput {
    Line { request: LineRequest, mode: ModelMode },
    Dialogue { turns: Vec<DialogueTurn> },
}

impl GenerationInput {
    fn target(&self) -> GenerationTarget {
        match self {
            Self::Line { request, .. } => GenerationTarget::Line(request.line_id.clone()),
            Self::Dialogue { .. } => GenerationTarget::Dialogue,
        }
    }
}

/// 生成流水线，单行与整段生成共享
pub struct GenerationPipeline {
    session_manager: Arc<dyn SessionManagerPort>,
    audio_cache: Arc<dyn AudioCachePort>,
    synthesizer: Arc<dyn SpeechSynthesisPort>,
    playback: Arc<dyn PlaybackPort>,
    event_publisher: Arc<EventPublisher>,
    key_builder: CacheKeyBuilder,
    config: GenerationConfig,
}

impl GenerationPipeline {
    pub fn new(
        session_manager: Arc<dyn SessionManagerPort>,
        audio_cache: Arc<dyn AudioCachePort>,
        synthesizer: Arc<dyn SpeechSynthesisPort>,
        playback: Arc<dyn PlaybackPort>,
        event_publisher: Arc<EventPublisher>,
        config: GenerationConfig,
    ) -> Self {
        Self {
            session_manager,
            audio_cache,
            synthesizer,
            playback,
            event_publisher,
            key_builder: CacheKeyBuilder::new(),
            config,
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    fn ensure_session(&self, session_id: &str) -> Result<(), ApplicationError> {
        if !self.session_manager.is_valid(session_id) {
            return Err(ApplicationError::SessionNotFound(session_id.to_string()));
        }
        self.session_manager.touch(session_id);
        Ok(())
    }

    fn transition(
        &self,
        session_id: &str,
        target: &GenerationTarget,
        state: GenerationState,
        cache_key: Option<&str>,
    ) {
        tracing::debug!(
            session_id = %session_id,
            target = %target,
            state = state.as_str(),
            "Generation state changed"
        );
        self.event_publisher
            .publish_generation_state(session_id, target, state, cache_key);
    }

    /// 清除进行中标记；会话已关闭时忽略
    fn finish(&self, session_id: &str) {
        if let Err(e) = self.session_manager.set_generating(session_id, None) {
            tracing::debug!(session_id = %session_id, error = %e, "Session gone before generation finished");
        }
    }

    fn fail(
        &self,
        session_id: &str,
        target: &GenerationTarget,
        cache_key: Option<&str>,
        error: ApplicationError,
    ) -> ApplicationError {
        self.event_publisher
            .publish_generation_failed(session_id, target, cache_key, &error.to_string());
        self.finish(session_id);
        error
    }

    /// 安装新的播放句柄并释放旧句柄
    fn install(
        &self,
        session_id: &str,
        audio_data: Vec<u8>,
        source: AudioSource,
    ) -> Result<PlaybackHandle, ApplicationError> {
        let handle = self.playback.materialize(audio_data);

        match self.session_manager.replace_playback(session_id, handle.clone()) {
            Ok(Some(previous)) => self.playback.revoke(previous.id),
            Ok(None) => {}
            Err(_) => {
                self.playback.revoke(handle.id);
                return Err(ApplicationError::SessionClosed(session_id.to_string()));
            }
        }

        let delay = match source {
            AudioSource::Cache => self.config.cache_hit_delay,
            AudioSource::Generated => self.config.generated_delay,
        };
        self.playback
            .schedule_autoplay(session_id, &handle, source, delay);

        Ok(handle)
    }

    fn build_key(&self, input: &GenerationInput) -> Result<String, ApplicationError> {
        let output_format = Some(self.config.output_format.as_str());
        let key = match input {
            GenerationInput::Line { request, mode } => self.key_builder.line_key(
                &request.text,
                &request.voice_id,
                self.config.model_for(*mode),
                output_format,
            )?,
            GenerationInput::Dialogue { turns } => {
                self.key_builder
                    .dialogue_key(turns, &self.config.full_model_id, output_format)?
            }
        };
        Ok(key)
    }

    async fn synthesize(&self, input: &GenerationInput) -> Result<Vec<u8>, ApplicationError> {
        let result = match input {
            GenerationInput::Line { request, mode } if mode.is_fast() => {
                let options =
                    SynthesisOptions::new(&self.config.fast_model_id, &self.config.output_format);
                self.synthesizer
                    .synthesize_single(&request.text, &request.voice_id, &options)
                    .await
            }
            GenerationInput::Line { request, .. } => {
                let options =
                    SynthesisOptions::new(&self.config.full_model_id, &self.config.output_format);
                let turn = DialogueTurn::new(request.text.clone(), request.voice_id.clone());
                self.synthesizer
                    .synthesize_dialogue(std::slice::from_ref(&turn), &options)
                    .await
            }
            GenerationInput::Dialogue { turns } => {
                let options =
                    SynthesisOptions::new(&self.config.full_model_id, &self.config.output_format);
                self.synthesizer.synthesize_dialogue(turns, &options).await
            }
        };

        result.map_err(|e| ApplicationError::Synthesis(e.to_string()))
    }

    /// 后台写入缓存，不等待结果
    fn store(&self, cache_key: &str, audio_data: Vec<u8>) {
        let cache = self.audio_cache.clone();
        let cache_key = cache_key.to_string();
        tokio::spawn(async move {
            cache.put(&cache_key, audio_data).await;
        });
    }

    async fn run(
        &self,
        session_id: &str,
        input: GenerationInput,
    ) -> Result<GenerationResponse, ApplicationError> {
        let target = input.target();
        let model_id = match &input {
            GenerationInput::Line { mode, .. } => self.config.model_for(*mode).to_string(),
            GenerationInput::Dialogue { .. } => self.config.full_model_id.clone(),
        };

        self.session_manager
            .set_generating(session_id, Some(target.clone()))?;
        self.transition(session_id, &target, GenerationState::KeyBuilding, None);

        let cache_key = match self.build_key(&input) {
            Ok(key) => key,
            Err(e) => return Err(self.fail(session_id, &target, None, e)),
        };

        self.transition(session_id, &target, GenerationState::CacheProbe, Some(&cache_key));

        if let Some(cached) = self.audio_cache.get(&cache_key).await {
            tracing::info!(
                session_id = %session_id,
                target = %target,
                cache_key = %cache_key,
                size_bytes = cached.len(),
                "Using cached audio"
            );
            let playback = match self.install(session_id, cached, AudioSource::Cache) {
                Ok(handle) => handle,
                Err(e) => return Err(self.fail(session_id, &target, Some(&cache_key), e)),
            };
            self.transition(session_id, &target, GenerationState::Ready, Some(&cache_key));
            self.finish(session_id);

            return Ok(GenerationResponse {
                session_id: session_id.to_string(),
                target,
                cache_key,
                model_id,
                source: AudioSource::Cache,
                playback,
            });
        }

        self.transition(session_id, &target, GenerationState::Generating, Some(&cache_key));

        let audio_data = match self.synthesize(&input).await {
            Ok(audio) => audio,
            Err(e) => {
                tracing::error!(
                    session_id = %session_id,
                    target = %target,
                    cache_key = %cache_key,
                    error = %e,
                    "Audio generation failed"
                );
                return Err(self.fail(session_id, &target, Some(&cache_key), e));
            }
        };

        self.transition(session_id, &target, GenerationState::Storing, Some(&cache_key));
        self.store(&cache_key, audio_data.clone());

        let playback = match self.install(session_id, audio_data, AudioSource::Generated) {
            Ok(handle) => handle,
            Err(e) => {
                tracing::info!(
                    session_id = %session_id,
                    cache_key = %cache_key,
                    "Session closed during generation, audio cached without playback"
                );
                return Err(self.fail(session_id, &target, Some(&cache_key), e));
            }
        };

        self.transition(session_id, &target, GenerationState::Ready, Some(&cache_key));
        self.finish(session_id);

        tracing::info!(
            session_id = %session_id,
            target = %target,
            cache_key = %cache_key,
            size_bytes = playback.size_bytes,
            "Audio generated"
        );

        Ok(GenerationResponse {
            session_id: session_id.to_string(),
            target,
            cache_key,
            model_id,
            source: AudioSource::Generated,
            playback,
        })
    }
}

/// GenerateLine Handler - 单行预览
pub struct GenerateLineHandler {
    pipeline: Arc<GenerationPipeline>,
}

impl GenerateLineHandler {
    pub fn new(pipeline: Arc<GenerationPipeline>) -> Self {
        Self { pipeline }
    }

    pub async fn handle(
        &self,
        cmd: GenerateLineCommand,
    ) -> Result<GenerationResponse, ApplicationError> {
        self.pipeline.ensure_session(&cmd.session_id)?;

        let request = cmd.dialogue.resolve_line(&cmd.line_id, cmd.mode).map_err(|e| {
            tracing::debug!(
                session_id = %cmd.session_id,
                line_id = %cmd.line_id,
                error = %e,
                "Line rejected before generation"
            );
            e
        })?;

        self.pipeline
            .run(
                &cmd.session_id,
                GenerationInput::Line {
                    request,
                    mode: cmd.mode,
                },
            )
            .await
    }
}

/// GenerateDialogue Handler - 整段对话
pub struct GenerateDialogueHandler {
    pipeline: Arc<GenerationPipeline>,
}

impl GenerateDialogueHandler {
    pub fn new(pipeline: Arc<GenerationPipeline>) -> Self {
        Self { pipeline }
    }

    pub async fn handle(
        &self,
        cmd: GenerateDialogueCommand,
    ) -> Result<GenerationResponse, ApplicationError> {
        self.pipeline.ensure_session(&cmd.session_id)?;

        let turns = cmd.dialogue.resolve_turns().map_err(|e| {
            tracing::debug!(session_id = %cmd.session_id, error = %e, "Dialogue rejected before generation");
            e
        })?;

        if cmd.mode.is_fast() {
            tracing::info!(
                session_id = %cmd.session_id,
                "Full dialogue generation uses the full quality model"
            );
        }

        let response = self
            .pipeline
            .run(&cmd.session_id, GenerationInput::Dialogue { turns })
            .await?;

        if let Err(e) = self
            .pipeline
            .session_manager
            .set_dialogue_cached(&cmd.session_id, true)
        {
            tracing::debug!(session_id = %cmd.session_id, error = %e, "Failed to mark dialogue cached");
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::Session;
    use crate::domain::cache_key::{build_dialogue_key, build_line_key};
    use crate::domain::dialogue::{Dialogue, DialogueError, DialogueLine, Speaker};
    use crate::infrastructure::adapters::{FakeSpeechSynthesizer, SynthesisCall};
    use crate::infrastructure::events::WsEvent;
    use crate::infrastructure::memory::{InMemoryPlaybackRegistry, InMemorySessionManager};
    use crate::infrastructure::persistence::{SledAudioCache, SledCacheConfig};
    use crate::application::ports::AUDIO_CACHE_TTL;
    use tempfile::{tempdir, TempDir};
    use tokio::sync::Notify;

    struct Fixture {
        _dir: TempDir,
        sessions: Arc<InMemorySessionManager>,
        cache: Arc<SledAudioCache>,
        synth: Arc<FakeSpeechSynthesizer>,
        playback: Arc<InMemoryPlaybackRegistry>,
        publisher: Arc<EventPublisher>,
        pipeline: Arc<GenerationPipeline>,
        session_id: String,
    }

    fn fixture_with(synth: FakeSpeechSynthesizer, cache_enabled: bool) -> Fixture {
        let dir = tempdir().unwrap();
        let sessions = InMemorySessionManager::new().arc();
        let cache = SledAudioCache::new(SledCacheConfig {
            db_path: dir.path().join("cache.sled"),
            enabled: cache_enabled,
            ttl: AUDIO_CACHE_TTL,
        })
        .arc();
        let synth = synth.arc();
        let publisher = EventPublisher::new().arc();
        let playback = InMemoryPlaybackRegistry::new(publisher.clone()).arc();

        let pipeline = GenerationPipeline::new(
            sessions.clone(),
            cache.clone(),
            synth.clone(),
            playback.clone(),
            publisher.clone(),
            GenerationConfig::default(),
        )
        .arc();

        let session_id = sessions.create(Session::new()).unwrap();

        Fixture {
            _dir: dir,
            sessions,
            cache,
            synth,
            playback,
            publisher,
            pipeline,
            session_id,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(FakeSpeechSynthesizer::new(), true)
    }

    fn sample_dialogue() -> Dialogue {
        Dialogue::new(
            vec![
                DialogueLine::new("l1", "[excited] Hello there", "s1"),
                DialogueLine::new("l2", "Hi Alice", "s2"),
                DialogueLine::new("l3", "[laughs]", "s1"),
            ],
            vec![
                Speaker::new("s1", "v-alice").with_name("Alice"),
                Speaker::new("s2", "v-bob").with_name("Bob"),
            ],
        )
    }

    fn line_cmd(f: &Fixture, line_id: &str, mode: ModelMode) -> GenerateLineCommand {
        GenerateLineCommand {
            session_id: f.session_id.clone(),
            dialogue: sample_dialogue(),
            line_id: line_id.to_string(),
            mode,
        }
    }

    async fn wait_for_cached(cache: &SledAudioCache, key: &str) -> bool {
        for _ in 0..200 {
            if cache.get(key).await.is_some() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        false
    }

    #[tokio::test]
    async fn test_line_miss_then_hit() {
        let f = fixture();
        let handler = GenerateLineHandler::new(f.pipeline.clone());

        let first = handler.handle(line_cmd(&f, "l2", ModelMode::Full)).await.unwrap();
        assert_eq!(first.source, AudioSource::Generated);
        assert_eq!(first.model_id, FULL_MODEL_ID);
        assert_eq!(
            f.synth.calls().await,
            vec![SynthesisCall::Dialogue {
                turns: vec![DialogueTurn::new("Hi Alice", "v-bob")],
                model_id: FULL_MODEL_ID.to_string(),
            }]
        );
        assert!(wait_for_cached(&f.cache, &first.cache_key).await);

        let second = handler.handle(line_cmd(&f, "l2", ModelMode::Full)).await.unwrap();
        assert!(second.from_cache());
        assert_eq!(second.cache_key, first.cache_key);
        assert_eq!(f.synth.call_count().await, 1);
        assert_eq!(
            f.playback.fetch(second.playback.id),
            Some(FakeSpeechSynthesizer::render(
                FULL_MODEL_ID,
                DEFAULT_OUTPUT_FORMAT,
                &[("Hi Alice", "v-bob")]
            ))
        );

        let session = f.sessions.get(&f.session_id).unwrap();
        assert!(!session.is_generating());
        assert_eq!(session.playback, Some(second.playback));
    }

    #[tokio::test]
    async fn test_fast_mode_strips_tags() {
        let f = fixture();
        let handler = GenerateLineHandler::new(f.pipeline.clone());

        let response = handler.handle(line_cmd(&f, "l1", ModelMode::Fast)).await.unwrap();

        assert_eq!(
            f.synth.calls().await,
            vec![SynthesisCall::Single {
                text: "Hello there".to_string(),
                voice_id: "v-alice".to_string(),
                model_id: FAST_MODEL_ID.to_string(),
            }]
        );
        assert_eq!(
            response.cache_key,
            build_line_key("Hello there", "v-alice", FAST_MODEL_ID, None).unwrap()
        );
    }

    #[tokio::test]
    async fn test_full_mode_keeps_tags_in_key() {
        let f = fixture();
        let handler = GenerateLineHandler::new(f.pipeline.clone());

        let response = handler.handle(line_cmd(&f, "l1", ModelMode::Full)).await.unwrap();
        assert_eq!(
            response.cache_key,
            build_line_key("[excited] Hello there", "v-alice", FULL_MODEL_ID, None).unwrap()
        );
    }

    #[tokio::test]
    async fn test_tags_only_line_rejected_in_fast_mode() {
        let f = fixture();
        let handler = GenerateLineHandler::new(f.pipeline.clone());

        let err = handler
            .handle(line_cmd(&f, "l3", ModelMode::Fast))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::Validation(DialogueError::TagsOnly { .. })
        ));
        assert_eq!(f.synth.call_count().await, 0);

        assert!(handler.handle(line_cmd(&f, "l3", ModelMode::Full)).await.is_ok());
    }

    #[tokio::test]
    async fn test_dialogue_validation_precedes_synthesis() {
        let f = fixture();
        let handler = GenerateDialogueHandler::new(f.pipeline.clone());

        let dialogue = Dialogue::new(
            vec![
                DialogueLine::new("l1", "Hello", "s1"),
                DialogueLine::new("l2", "Hi", "s3"),
                DialogueLine::new("l3", "Bye", "s1"),
            ],
            vec![
                Speaker::new("s1", "v-alice").with_name("Alice"),
                Speaker::new("s3", "").with_name("Carol"),
            ],
        );

        let err = handler
            .handle(GenerateDialogueCommand {
                session_id: f.session_id.clone(),
                dialogue,
                mode: ModelMode::Full,
            })
            .await
            .unwrap_err();

        assert!(err.is_validation());
        assert_eq!(err.to_string(), "Speaker \"Carol\" has no voice assigned");
        assert_eq!(f.synth.call_count().await, 0);
        assert!(!f.sessions.get(&f.session_id).unwrap().is_generating());
    }

    #[tokio::test]
    async fn test_dialogue_always_uses_full_model() {
        let f = fixture();
        let handler = GenerateDialogueHandler::new(f.pipeline.clone());

        let response = handler
            .handle(GenerateDialogueCommand {
                session_id: f.session_id.clone(),
                dialogue: sample_dialogue(),
                mode: ModelMode::Fast,
            })
            .await
            .unwrap();

        assert_eq!(response.model_id, FULL_MODEL_ID);
        assert_eq!(
            response.cache_key,
            build_dialogue_key(&sample_dialogue().to_turns(), FULL_MODEL_ID, None).unwrap()
        );
        match &f.synth.calls().await[0] {
            SynthesisCall::Dialogue { turns, model_id } => {
                assert_eq!(model_id, FULL_MODEL_ID);
                assert_eq!(turns.len(), 3);
                assert_eq!(turns[0].text, "[excited] Hello there");
            }
            other => panic!("unexpected call: {:?}", other),
        }
        assert!(f.sessions.get(&f.session_id).unwrap().dialogue_cached);
    }

    #[tokio::test]
    async fn test_synthesis_failure_surfaces_message() {
        let f = fixture();
        f.synth.set_failure(Some("quota exceeded")).await;
        let handler = GenerateLineHandler::new(f.pipeline.clone());

        let err = handler
            .handle(line_cmd(&f, "l2", ModelMode::Full))
            .await
            .unwrap_err();

        match &err {
            ApplicationError::Synthesis(message) => assert!(message.contains("quota exceeded")),
            other => panic!("unexpected error: {:?}", other),
        }
        let session = f.sessions.get(&f.session_id).unwrap();
        assert!(!session.is_generating());
        assert!(session.playback.is_none());
        assert_eq!(f.cache.stats().await.entry_count, 0);
    }

    #[tokio::test]
    async fn test_storage_unavailable_still_generates() {
        let f = fixture_with(FakeSpeechSynthesizer::new(), false);
        let handler = GenerateLineHandler::new(f.pipeline.clone());

        let first = handler.handle(line_cmd(&f, "l2", ModelMode::Full)).await.unwrap();
        let second = handler.handle(line_cmd(&f, "l2", ModelMode::Full)).await.unwrap();

        assert_eq!(first.source, AudioSource::Generated);
        assert_eq!(second.source, AudioSource::Generated);
        assert_eq!(f.synth.call_count().await, 2);
        assert!(f.playback.is_live(second.playback.id));
    }

    #[tokio::test]
    async fn test_new_playback_revokes_previous() {
        let f = fixture();
        let handler = GenerateLineHandler::new(f.pipeline.clone());

        let first = handler.handle(line_cmd(&f, "l1", ModelMode::Full)).await.unwrap();
        let second = handler.handle(line_cmd(&f, "l2", ModelMode::Full)).await.unwrap();

        assert!(!f.playback.is_live(first.playback.id));
        assert!(f.playback.is_live(second.playback.id));
        assert_eq!(f.playback.live_count(), 1);
    }

    #[tokio::test]
    async fn test_session_closed_during_synthesis() {
        let gate = Arc::new(Notify::new());
        let f = fixture_with(FakeSpeechSynthesizer::new().with_gate(gate.clone()), true);
        let handler = Arc::new(GenerateLineHandler::new(f.pipeline.clone()));

        let cmd = line_cmd(&f, "l2", ModelMode::Full);
        let task = {
            let handler = handler.clone();
            tokio::spawn(async move { handler.handle(cmd).await })
        };

        while f.synth.call_count().await == 0 {
            tokio::task::yield_now().await;
        }
        f.sessions.close(&f.session_id).unwrap();
        gate.notify_one();

        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(err, ApplicationError::SessionClosed(_)));
        assert_eq!(f.playback.live_count(), 0);

        let key = build_line_key("Hi Alice", "v-bob", FULL_MODEL_ID, None).unwrap();
        assert!(wait_for_cached(&f.cache, &key).await);
    }

    #[tokio::test]
    async fn test_unknown_session_rejected() {
        let f = fixture();
        let handler = GenerateLineHandler::new(f.pipeline.clone());
        let mut cmd = line_cmd(&f, "l2", ModelMode::Full);
        cmd.session_id = "missing".to_string();

        let err = handler.handle(cmd).await.unwrap_err();
        assert!(matches!(err, ApplicationError::SessionNotFound(_)));
        assert_eq!(f.synth.call_count().await, 0);
    }

    #[tokio::test]
    async fn test_state_transitions_published() {
        let f = fixture();
        let mut rx = f.publisher.register_session(&f.session_id);
        let handler = GenerateLineHandler::new(f.pipeline.clone());

        handler.handle(line_cmd(&f, "l2", ModelMode::Full)).await.unwrap();

        let mut states = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let WsEvent::GenerationStateChanged { state, target, .. } = event {
                assert_eq!(target, "line:l2");
                states.push(state);
            }
        }
        assert_eq!(
            states,
            vec!["key_building", "cache_probe", "generating", "storing", "ready"]
        );
    }
}
