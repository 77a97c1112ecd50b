//! rodio-backed playback session.
//!
//! Audio runs on its own thread, driven by commands over an mpsc channel.
//! The UI reads a shared `NowPlaying` projection; commands that change it
//! also update it right away so the screen never waits on the audio thread.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink};

use crate::library::{MediaIndex, Track, TrackId};

use super::session::{PlaybackError, PlaybackSession};

#[derive(Debug)]
enum AudioCmd {
    /// Start `track`, found at `path`, from the beginning.
    Load { track: Track, path: PathBuf },
    Resume,
    Pause,
    /// Queue used for auto-advance.
    SetQueue(Vec<Track>),
    /// Quit the audio thread, fading out over `fade_out_ms` milliseconds.
    Quit { fade_out_ms: u64 },
}

/// Runtime playback information shared with the UI.
#[derive(Debug, Clone, Default)]
pub struct NowPlaying {
    pub track: Option<Track>,
    pub playing: bool,
    pub elapsed: Duration,
}

pub type NowPlayingHandle = Arc<Mutex<NowPlaying>>;

pub struct RodioSession {
    tx: Sender<AudioCmd>,
    index: Arc<dyn MediaIndex>,
    queue: Mutex<Vec<Track>>,
    now_playing: NowPlayingHandle,
    /// Commands sent but not yet picked up by the audio thread.
    queued: Arc<AtomicUsize>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl RodioSession {
    pub fn new(index: Arc<dyn MediaIndex>) -> Self {
        let (tx, rx) = mpsc::channel::<AudioCmd>();
        let now_playing: NowPlayingHandle = Arc::default();
        let queued = Arc::new(AtomicUsize::new(0));
        let join = spawn_audio_thread(
            rx,
            Arc::clone(&index),
            now_playing.clone(),
            Arc::clone(&queued),
        );

        Self {
            tx,
            index,
            queue: Mutex::new(Vec::new()),
            now_playing,
            queued,
            join: Mutex::new(join),
        }
    }

    pub fn now_playing(&self) -> NowPlaying {
        self.now_playing
            .lock()
            .map(|np| np.clone())
            .unwrap_or_default()
    }

    /// Fade out, stop the audio thread and wait for it.
    pub fn quit_softly(&self, fade_out: Duration) {
        self.send(AudioCmd::Quit {
            fade_out_ms: fade_out.as_millis() as u64,
        });

        if let Ok(mut j) = self.join.lock() {
            if let Some(h) = j.take() {
                let _ = h.join();
            }
        }
    }

    fn send(&self, cmd: AudioCmd) {
        self.queued.fetch_add(1, Ordering::SeqCst);
        if let Err(e) = self.tx.send(cmd) {
            self.queued.fetch_sub(1, Ordering::SeqCst);
            tracing::warn!(cmd = ?e.0, "audio thread is gone");
        }
    }

    /// Show the effect of `cmd` right away, then send it.
    ///
    /// Both happen under the `NowPlaying` lock, so the audio thread cannot
    /// publish its older state in between.
    fn command(&self, cmd: AudioCmd, show: impl FnOnce(&mut NowPlaying)) {
        match self.now_playing.lock() {
            Ok(mut np) => {
                show(&mut np);
                self.send(cmd);
            }
            Err(_) => self.send(cmd),
        }
    }

    fn step(&self, delta: isize) -> Result<(), PlaybackError> {
        let next = {
            let Ok(queue) = self.queue.lock() else {
                return Ok(());
            };
            match wrap_step(&queue, self.current_track(), delta) {
                Some(i) => queue[i].clone(),
                None => return Ok(()),
            }
        };
        self.start(&next).inspect_err(|e| {
            tracing::warn!(id = %next.id, error = %e, "cannot step to track");
        })
    }
}

impl PlaybackSession for RodioSession {
    fn set_queue(&self, tracks: Vec<Track>) {
        if let Ok(mut q) = self.queue.lock() {
            *q = tracks.clone();
        }
        self.send(AudioCmd::SetQueue(tracks));
    }

    fn start(&self, track: &Track) -> Result<(), PlaybackError> {
        let path = resolve(self.index.as_ref(), track.id)?;
        let load = AudioCmd::Load {
            track: track.clone(),
            path,
        };
        self.command(load, |np| {
            np.track = Some(track.clone());
            np.playing = true;
            np.elapsed = Duration::ZERO;
        });
        Ok(())
    }

    fn play(&self) {
        self.command(AudioCmd::Resume, |np| np.playing = np.track.is_some());
    }

    fn pause(&self) {
        self.command(AudioCmd::Pause, |np| np.playing = false);
    }

    fn play_next(&self) -> Result<(), PlaybackError> {
        self.step(1)
    }

    fn play_previous(&self) -> Result<(), PlaybackError> {
        self.step(-1)
    }

    fn is_playing(&self) -> bool {
        self.now_playing.lock().map(|np| np.playing).unwrap_or(false)
    }

    fn elapsed(&self) -> Duration {
        self.now_playing
            .lock()
            .map(|np| np.elapsed)
            .unwrap_or_default()
    }

    fn current_title(&self) -> Option<String> {
        let np = self.now_playing.lock().ok()?;
        np.track.as_ref().map(|t| t.display_name.clone())
    }

    fn current_track(&self) -> Option<TrackId> {
        let np = self.now_playing.lock().ok()?;
        np.track.as_ref().map(|t| t.id)
    }
}

/// Where the audio for `id` lives, if it is still there.
pub(super) fn resolve(index: &dyn MediaIndex, id: TrackId) -> Result<PathBuf, PlaybackError> {
    let path = index.locate(id)?.ok_or(PlaybackError::Missing(id))?;
    match File::open(&path) {
        Ok(_) => Ok(path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(PlaybackError::Missing(id)),
        Err(source) => Err(PlaybackError::Open { path, source }),
    }
}

/// Queue position `delta` steps away from `current`, wrapping at both ends.
/// With nothing current, forward starts at the first track and backward at
/// the last.
pub(super) fn wrap_step(queue: &[Track], current: Option<TrackId>, delta: isize) -> Option<usize> {
    if queue.is_empty() {
        return None;
    }
    let len = queue.len() as isize;
    let pos = current.and_then(|id| queue.iter().position(|t| t.id == id));
    let next = match pos {
        Some(p) => (p as isize + delta).rem_euclid(len),
        None if delta < 0 => len - 1,
        None => 0,
    };
    Some(next as usize)
}

/// Fold what the audio thread knows into `np`.
///
/// While commands are still `queued`, `np` already shows their effect and
/// the audio thread's view is older, so it is left alone.
pub(super) fn merge_published(
    np: &mut NowPlaying,
    queued: usize,
    track: Option<&Track>,
    playing: bool,
    elapsed: Duration,
) {
    if queued > 0 {
        return;
    }
    np.track = track.cloned();
    np.playing = playing;
    np.elapsed = elapsed;
}

fn spawn_audio_thread(
    rx: Receiver<AudioCmd>,
    index: Arc<dyn MediaIndex>,
    now_playing: NowPlayingHandle,
    queued: Arc<AtomicUsize>,
) -> Option<JoinHandle<()>> {
    let spawned = thread::Builder::new()
        .name("encore-audio".into())
        .spawn(move || {
            let mut stream = match OutputStreamBuilder::open_default_stream() {
                Ok(stream) => stream,
                Err(e) => {
                    tracing::error!(error = %e, "no audio output device, playback disabled");
                    drain_silently(rx, &now_playing, &queued);
                    return;
                }
            };
            // rodio logs to stderr when OutputStream is dropped, which would
            // scribble over the TUI.
            stream.log_on_drop(false);

            AudioThread::new(stream, index, now_playing, queued).run(rx);
        });

    match spawned {
        Ok(h) => Some(h),
        Err(e) => {
            tracing::error!(error = %e, "failed to spawn audio thread");
            None
        }
    }
}

/// Without an output device, accept commands but never report playing.
fn drain_silently(rx: Receiver<AudioCmd>, now_playing: &NowPlayingHandle, queued: &AtomicUsize) {
    for cmd in rx.iter() {
        queued.fetch_sub(1, Ordering::SeqCst);
        if matches!(cmd, AudioCmd::Quit { .. }) {
            break;
        }
        if let Ok(mut np) = now_playing.lock() {
            np.playing = false;
        }
    }
}

struct AudioThread {
    stream: OutputStream,
    index: Arc<dyn MediaIndex>,
    now_playing: NowPlayingHandle,
    queued: Arc<AtomicUsize>,
    queue: Vec<Track>,
    current: Option<Track>,
    sink: Option<Sink>,
    paused: bool,
    // Start of the current unpaused stretch, plus everything played before it.
    started_at: Option<Instant>,
    accumulated: Duration,
}

impl AudioThread {
    fn new(
        stream: OutputStream,
        index: Arc<dyn MediaIndex>,
        now_playing: NowPlayingHandle,
        queued: Arc<AtomicUsize>,
    ) -> Self {
        Self {
            stream,
            index,
            now_playing,
            queued,
            queue: Vec::new(),
            current: None,
            sink: None,
            paused: true,
            started_at: None,
            accumulated: Duration::ZERO,
        }
    }

    fn run(mut self, rx: Receiver<AudioCmd>) {
        loop {
            let cmd = match rx.recv_timeout(Duration::from_millis(200)) {
                Ok(cmd) => cmd,
                // periodic check for auto-advance
                Err(RecvTimeoutError::Timeout) => {
                    self.tick();
                    continue;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            };
            self.queued.fetch_sub(1, Ordering::SeqCst);
            match cmd {
                AudioCmd::Load { track, path } => self.load(track, &path),
                AudioCmd::Resume => self.resume(),
                AudioCmd::Pause => self.pause(),
                AudioCmd::SetQueue(queue) => self.queue = queue,
                AudioCmd::Quit { fade_out_ms } => {
                    self.quit(fade_out_ms);
                    break;
                }
            }
        }
    }

    fn load(&mut self, track: Track, path: &Path) {
        if let Some(old) = self.sink.take() {
            old.stop();
        }
        self.accumulated = Duration::ZERO;

        match open_sink(&self.stream, path) {
            Ok(sink) => {
                sink.play();
                self.sink = Some(sink);
                self.paused = false;
                self.started_at = Some(Instant::now());
                tracing::debug!(id = %track.id, path = %path.display(), "playing");
            }
            Err(e) => {
                tracing::warn!(id = %track.id, error = %e, "cannot play track");
                self.paused = true;
                self.started_at = None;
            }
        }
        self.current = Some(track);
        self.publish();
    }

    fn resume(&mut self) {
        if let Some(s) = &self.sink {
            if self.paused {
                s.play();
                self.paused = false;
                self.started_at = Some(Instant::now());
            }
        }
        self.publish();
    }

    fn pause(&mut self) {
        if let Some(s) = &self.sink {
            if !self.paused {
                s.pause();
                self.paused = true;
                if let Some(st) = self.started_at.take() {
                    self.accumulated += st.elapsed();
                }
            }
        }
        self.publish();
    }

    fn tick(&mut self) {
        let finished = matches!(&self.sink, Some(s) if !self.paused && s.empty());
        if finished {
            self.advance();
        } else {
            self.publish();
        }
    }

    /// End of track: move on to the next one, wrapping at the end.
    fn advance(&mut self) {
        let current = self.current.as_ref().map(|t| t.id);
        let Some(next) = wrap_step(&self.queue, current, 1) else {
            self.stop();
            return;
        };
        let track = self.queue[next].clone();
        match resolve(self.index.as_ref(), track.id) {
            Ok(path) => self.load(track, &path),
            Err(e) => {
                tracing::warn!(id = %track.id, error = %e, "auto-advance stopped");
                self.stop();
            }
        }
    }

    fn stop(&mut self) {
        if let Some(s) = self.sink.take() {
            s.stop();
        }
        self.paused = true;
        self.started_at = None;
        self.accumulated = Duration::ZERO;
        self.publish();
    }

    fn quit(&mut self, fade_out_ms: u64) {
        if let Some(s) = &self.sink {
            // Fade out gently before stopping.
            fade_out_sink(s, fade_out_ms);
            s.stop();
        }
        self.paused = true;
        self.publish();
    }

    fn elapsed(&self) -> Duration {
        self.accumulated + self.started_at.map_or(Duration::ZERO, |st| st.elapsed())
    }

    fn publish(&self) {
        if let Ok(mut np) = self.now_playing.lock() {
            merge_published(
                &mut np,
                self.queued.load(Ordering::SeqCst),
                self.current.as_ref(),
                self.sink.is_some() && !self.paused,
                self.elapsed(),
            );
        }
    }
}

/// A paused `Sink` for the file at `path`.
fn open_sink(stream: &OutputStream, path: &Path) -> Result<Sink, PlaybackError> {
    let file = File::open(path).map_err(|source| PlaybackError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let source = Decoder::new(BufReader::new(file)).map_err(|source| PlaybackError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    let sink = Sink::connect_new(stream.mixer());
    sink.append(source);
    sink.pause();
    Ok(sink)
}

fn fade_out_sink(sink: &Sink, fade_out_ms: u64) {
    if fade_out_ms == 0 {
        sink.set_volume(0.0);
        return;
    }
    let steps: u64 = 20;
    let step_ms = (fade_out_ms / steps).max(1);
    for step in 1..=steps {
        let t = step as f32 / steps as f32;
        sink.set_volume(1.0 - t);
        thread::sleep(Duration::from_millis(step_ms));
    }
    sink.set_volume(0.0);
}
