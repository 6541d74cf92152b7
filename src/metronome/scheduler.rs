// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Beat scheduler.
//!
//! A dedicated clock thread sleeps until absolute beat deadlines. Audio for
//! a beat is handed to the device `lookahead` before its onset, stamped with
//! the exact onset instant; the beat callback runs `render_lead` before it.
//!
//! Lock order is `dispatch` then `inner`. `stop` and `pause` bump an epoch
//! under `inner`, and the clock thread re-checks that epoch while holding
//! `dispatch`, so once they return no further callback can start.

use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, OnceLock, PoisonError};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use super::{MetronomeError, SchedulerConfig};
use crate::audio::{
    volume_to_gain, AudioDevice, SliceRequest, SliceRotation, SoundAsset, SLICE_FADE_OUT,
};
use crate::timing::{BeatClock, ClockState};

/// Called with the beat count on every beat
pub type BeatCallback = Box<dyn FnMut(u64) + Send + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AudioStatus {
    Uninitialized,
    Ready,
    Unavailable,
}

struct Inner {
    clock: BeatClock,
    volume: u8,
    muted: bool,
    sound: String,
    assets: HashMap<String, SoundAsset>,
    rotation: SliceRotation,
    /// Audio for the pending onset has been handed to the device
    slice_sent: bool,
    epoch: u64,
    audio: AudioStatus,
    disposed: bool,
    /// Callback installed from inside a callback, applied before the next beat
    pending_callback: Option<BeatCallback>,
    lookahead: Duration,
    render_lead: Duration,
    device: Box<dyn AudioDevice>,
}

impl Inner {
    fn init_audio(&mut self) {
        if self.audio != AudioStatus::Uninitialized {
            return;
        }
        if let Err(e) = self.device.start() {
            error!("audio unavailable, beats continue silently: {}", e);
            self.audio = AudioStatus::Unavailable;
            return;
        }
        for asset in self.assets.values() {
            if let Err(e) = self.device.load_sound(asset) {
                error!("{}", e);
            }
        }
        self.audio = AudioStatus::Ready;
    }

    fn send_slice(&mut self, onset: Instant) {
        if self.audio != AudioStatus::Ready || self.muted {
            return;
        }
        let gain = volume_to_gain(self.volume);
        if gain <= 0.0 {
            return;
        }
        let Some(loop_len) = self.device.buffer_duration(&self.sound) else {
            debug!(sound = %self.sound, "no buffer for sound, beat is silent");
            return;
        };
        let request = SliceRequest {
            at: onset,
            offset: self.rotation.offset(loop_len),
            duration: self.rotation.slice_duration(),
            gain,
            fade_out: SLICE_FADE_OUT,
        };
        if let Err(e) = self.device.play_slice(&self.sound, request) {
            debug!("slice dropped: {}", e);
        }
    }

    /// Invalidate the pending beat
    fn halt(&mut self) {
        self.epoch += 1;
        self.slice_sent = false;
        if self.audio == AudioStatus::Ready {
            self.device.cancel_pending();
        }
    }
}

struct Shared {
    inner: Mutex<Inner>,
    wake: Condvar,
    dispatch: Mutex<Option<BeatCallback>>,
    clock_thread: OnceLock<ThreadId>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Cloneable control surface, usable from inside the beat callback
#[derive(Clone)]
pub struct SchedulerHandle {
    shared: Arc<Shared>,
}

impl SchedulerHandle {
    fn on_clock_thread(&self) -> bool {
        self.shared.clock_thread.get() == Some(&thread::current().id())
    }

    /// Block until an in-flight callback has returned
    fn wait_for_callback(&self) {
        if !self.on_clock_thread() {
            drop(lock(&self.shared.dispatch));
        }
    }

    /// Start or resume. The first call opens the audio device.
    pub fn start(&self) -> Result<(), MetronomeError> {
        let mut inner = lock(&self.shared.inner);
        if inner.disposed {
            return Err(MetronomeError::Disposed);
        }
        inner.init_audio();
        let resuming = inner.clock.state() == ClockState::Paused;
        if inner.clock.start(Instant::now()) {
            info!(
                bpm = inner.clock.bpm(),
                "metronome {}",
                if resuming { "resumed" } else { "started" }
            );
            self.shared.wake.notify_all();
        }
        Ok(())
    }

    /// Halt, keeping phase, beat count and slice position
    pub fn pause(&self) {
        {
            let mut inner = lock(&self.shared.inner);
            if inner.clock.state() != ClockState::Running {
                return;
            }
            inner.clock.pause(Instant::now());
            inner.halt();
            debug!(beat = inner.clock.beat(), "metronome paused");
        }
        self.shared.wake.notify_all();
        self.wait_for_callback();
    }

    /// Halt and rewind phase, beat count and slice position
    pub fn stop(&self) {
        {
            let mut inner = lock(&self.shared.inner);
            if inner.clock.state() == ClockState::Stopped {
                return;
            }
            inner.clock.stop();
            inner.rotation.reset();
            inner.halt();
            debug!("metronome stopped");
        }
        self.shared.wake.notify_all();
        self.wait_for_callback();
    }

    pub fn set_tempo(&self, bpm: f64) {
        lock(&self.shared.inner).clock.set_bpm(bpm);
    }

    pub fn set_volume(&self, volume: u8) {
        lock(&self.shared.inner).volume = volume.min(100);
    }

    pub fn set_muted(&self, muted: bool) {
        lock(&self.shared.inner).muted = muted;
    }

    /// Select a loaded sound for subsequent beats
    pub fn set_sound(&self, name: &str) {
        let mut inner = lock(&self.shared.inner);
        if inner.sound == name {
            return;
        }
        let geometry = inner
            .assets
            .get(name)
            .map(|a| (a.reference_bpm, a.slice_count));
        match geometry {
            Some((bpm, slices)) => inner.rotation.reconfigure(bpm, slices),
            None => warn!(sound = name, "unknown metronome sound, beats will be silent"),
        }
        inner.sound = name.to_string();
    }

    /// Install the beat callback, replacing any previous one.
    ///
    /// From inside a callback the new one takes effect on the next beat.
    pub fn set_beat_callback<F>(&self, callback: F)
    where
        F: FnMut(u64) + Send + 'static,
    {
        let callback: BeatCallback = Box::new(callback);
        if self.on_clock_thread() {
            lock(&self.shared.inner).pending_callback = Some(callback);
            return;
        }
        let mut dispatch = lock(&self.shared.dispatch);
        lock(&self.shared.inner).pending_callback = None;
        *dispatch = Some(callback);
    }

    pub fn state(&self) -> ClockState {
        lock(&self.shared.inner).clock.state()
    }

    pub fn is_running(&self) -> bool {
        self.state() == ClockState::Running
    }

    pub fn tempo(&self) -> f64 {
        lock(&self.shared.inner).clock.bpm()
    }

    pub fn volume(&self) -> u8 {
        lock(&self.shared.inner).volume
    }

    pub fn is_muted(&self) -> bool {
        lock(&self.shared.inner).muted
    }

    pub fn sound(&self) -> String {
        lock(&self.shared.inner).sound.clone()
    }

    /// Beats fired since the last stop
    pub fn beat_count(&self) -> u64 {
        lock(&self.shared.inner).clock.beat()
    }

    /// Slice of the loop the next beat will play
    pub fn slice_index(&self) -> u32 {
        lock(&self.shared.inner).rotation.index()
    }

    pub fn is_disposed(&self) -> bool {
        lock(&self.shared.inner).disposed
    }
}

fn wait_for<'a>(
    wake: &Condvar,
    guard: MutexGuard<'a, Inner>,
    timeout: Duration,
) -> MutexGuard<'a, Inner> {
    match wake.wait_timeout(guard, timeout) {
        Ok((guard, _)) => guard,
        Err(poisoned) => poisoned.into_inner().0,
    }
}

fn run(shared: Arc<Shared>) {
    let _ = shared.clock_thread.set(thread::current().id());
    let mut inner = lock(&shared.inner);

    loop {
        if inner.disposed {
            break;
        }
        let Some(onset) = inner.clock.next_onset() else {
            inner = shared
                .wake
                .wait(inner)
                .unwrap_or_else(PoisonError::into_inner);
            continue;
        };

        let now = Instant::now();
        if !inner.slice_sent {
            let send_at = onset.checked_sub(inner.lookahead).unwrap_or(onset);
            if now < send_at {
                inner = wait_for(&shared.wake, inner, send_at - now);
                continue;
            }
            inner.send_slice(onset);
            inner.slice_sent = true;
        }

        let fire_at = onset.checked_sub(inner.render_lead).unwrap_or(onset);
        if now < fire_at {
            inner = wait_for(&shared.wake, inner, fire_at - now);
            continue;
        }

        // Take `dispatch` before committing the beat, so a halt either
        // lands before the commit or waits for the callback
        let epoch = inner.epoch;
        drop(inner);
        let mut callback = lock(&shared.dispatch);
        inner = lock(&shared.inner);
        if inner.epoch != epoch || inner.clock.next_onset() != Some(onset) {
            continue;
        }
        let Some(count) = inner.clock.fire() else {
            continue;
        };
        inner.rotation.advance();
        inner.slice_sent = false;
        if let Some(next) = inner.pending_callback.take() {
            *callback = Some(next);
        }
        drop(inner);

        if let Some(callback) = callback.as_mut() {
            callback(count);
        }
        drop(callback);
        inner = lock(&shared.inner);
    }

    debug!("clock thread exiting");
}

/// Metronome with a dedicated clock thread
pub struct BeatScheduler {
    handle: SchedulerHandle,
    thread: Option<JoinHandle<()>>,
}

impl BeatScheduler {
    /// Create a stopped scheduler playing through `device`.
    ///
    /// The device is not opened until the first `start`.
    pub fn new(device: Box<dyn AudioDevice>, config: SchedulerConfig) -> Result<Self, MetronomeError> {
        let assets: HashMap<String, SoundAsset> = config
            .sounds
            .into_iter()
            .map(|a| (a.name.clone(), a))
            .collect();
        let rotation = assets
            .get(&config.initial_sound)
            .map(|a| SliceRotation::new(a.reference_bpm, a.slice_count))
            .unwrap_or_else(|| {
                warn!(sound = %config.initial_sound, "initial sound is not configured");
                SliceRotation::new(100.0, 4)
            });

        let inner = Inner {
            clock: BeatClock::default(),
            volume: 70,
            muted: false,
            sound: config.initial_sound,
            assets,
            rotation,
            slice_sent: false,
            epoch: 0,
            audio: AudioStatus::Uninitialized,
            disposed: false,
            pending_callback: None,
            lookahead: config.lookahead,
            render_lead: config.render_lead.min(config.lookahead),
            device,
        };

        let shared = Arc::new(Shared {
            inner: Mutex::new(inner),
            wake: Condvar::new(),
            dispatch: Mutex::new(None),
            clock_thread: OnceLock::new(),
        });

        let thread_shared = Arc::clone(&shared);
        let thread = thread::Builder::new()
            .name("jamm-clock".to_string())
            .spawn(move || run(thread_shared))
            .map_err(|e| MetronomeError::Spawn(e.to_string()))?;

        Ok(Self {
            handle: SchedulerHandle { shared },
            thread: Some(thread),
        })
    }

    /// A control handle for use from callbacks or other threads
    pub fn handle(&self) -> SchedulerHandle {
        self.handle.clone()
    }

    pub fn start(&self) -> Result<(), MetronomeError> {
        self.handle.start()
    }

    pub fn pause(&self) {
        self.handle.pause();
    }

    pub fn stop(&self) {
        self.handle.stop();
    }

    pub fn set_tempo(&self, bpm: f64) {
        self.handle.set_tempo(bpm);
    }

    pub fn set_volume(&self, volume: u8) {
        self.handle.set_volume(volume);
    }

    pub fn set_muted(&self, muted: bool) {
        self.handle.set_muted(muted);
    }

    pub fn set_sound(&self, name: &str) {
        self.handle.set_sound(name);
    }

    pub fn set_beat_callback<F>(&self, callback: F)
    where
        F: FnMut(u64) + Send + 'static,
    {
        self.handle.set_beat_callback(callback);
    }

    pub fn state(&self) -> ClockState {
        self.handle.state()
    }

    pub fn beat_count(&self) -> u64 {
        self.handle.beat_count()
    }

    pub fn slice_index(&self) -> u32 {
        self.handle.slice_index()
    }

    /// Release audio and join the clock thread. The scheduler cannot be
    /// started again.
    pub fn dispose(&mut self) {
        let shared = Arc::clone(&self.handle.shared);
        {
            let mut inner = lock(&shared.inner);
            if inner.disposed && self.thread.is_none() {
                return;
            }
            inner.disposed = true;
            inner.clock.stop();
            inner.halt();
        }
        shared.wake.notify_all();
        self.handle.wait_for_callback();

        if let Some(thread) = self.thread.take() {
            if self.handle.on_clock_thread() {
                warn!("dispose called from the clock thread; not joining");
            } else if thread.join().is_err() {
                error!("clock thread panicked");
            }
        }

        *lock(&shared.dispatch) = None;
        let mut inner = lock(&shared.inner);
        inner.pending_callback = None;
        if inner.audio == AudioStatus::Ready {
            inner.device.release();
        }
        inner.audio = AudioStatus::Unavailable;
        info!("metronome disposed");
    }
}

impl Drop for BeatScheduler {
    fn drop(&mut self) {
        self.dispose();
    }
}
