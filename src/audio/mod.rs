pub mod chime;

use chime::Chime;

use anyhow::{anyhow, Context, Result};
use log::warn;
use rodio::{OutputStream, Sink};
use std::sync::{
    mpsc::{self, Sender},
    Arc, Mutex,
};
use std::thread;

use crate::settings::AlertSettings;

enum AudioCommand {
    PlayChime { volume: f32 },
    Stop,
}

/// Plays the timer-finished alert.
///
/// rodio's output stream is not `Send`, so playback lives on a dedicated
/// thread that is started lazily and fed over a channel. Cloning shares the
/// thread. Mute and volume are fixed from the settings at construction.
#[derive(Clone)]
pub struct AlertPlayer {
    tx: Arc<Mutex<Option<Sender<AudioCommand>>>>,
    enabled: bool,
    volume: f32,
}

impl AlertPlayer {
    pub fn new(settings: &AlertSettings) -> Self {
        Self {
            tx: Arc::new(Mutex::new(None)),
            enabled: settings.enabled,
            volume: settings.volume.clamp(0.0, 1.0),
        }
    }

    fn running_thread(&self) -> Option<Sender<AudioCommand>> {
        match self.tx.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn ensure_thread(&self) -> Result<Sender<AudioCommand>> {
        let mut guard = self
            .tx
            .lock()
            .map_err(|e| anyhow!("alert player lock poisoned: {e}"))?;
        if let Some(tx) = guard.as_ref() {
            return Ok(tx.clone());
        }

        let (tx, rx) = mpsc::channel::<AudioCommand>();

        thread::Builder::new()
            .name("alert-audio".to_string())
            .spawn(move || {
                let mut _stream: Option<OutputStream> = None;
                let mut sink: Option<Sink> = None;

                fn ensure_sink(
                    stream: &mut Option<OutputStream>,
                    sink: &mut Option<Sink>,
                ) -> Result<()> {
                    if sink.is_none() {
                        let (s, handle) = OutputStream::try_default()
                            .context("Failed to create audio output stream")?;
                        let new_sink =
                            Sink::try_new(&handle).context("Failed to create audio sink")?;
                        *stream = Some(s);
                        *sink = Some(new_sink);
                    }
                    Ok(())
                }

                while let Ok(cmd) = rx.recv() {
                    match cmd {
                        AudioCommand::PlayChime { volume } => {
                            if let Err(err) = ensure_sink(&mut _stream, &mut sink) {
                                warn!("Cannot play timer alert: {err:#}");
                                continue;
                            }
                            if let Some(ref s) = sink {
                                s.set_volume(volume);
                                s.append(Chime::new());
                            }
                        }
                        AudioCommand::Stop => {
                            if let Some(s_old) = sink.take() {
                                s_old.stop();
                            }
                            _stream = None;
                        }
                    }
                }
            })
            .context("Failed to spawn alert audio thread")?;

        *guard = Some(tx.clone());
        Ok(tx)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Queues the chime. A muted player does nothing.
    pub fn play_chime(&self) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }
        let tx = self.ensure_thread()?;
        tx.send(AudioCommand::PlayChime {
            volume: self.volume,
        })
        .map_err(|e| anyhow!("alert audio thread is gone: {e}"))
    }

    /// Cuts off a chime that is still playing. Never starts the audio thread.
    pub fn stop(&self) {
        if let Some(tx) = self.running_thread() {
            let _ = tx.send(AudioCommand::Stop);
        }
    }

    /// Completion callback for a step timer: plays the chime and logs
    /// instead of failing when no audio device is available.
    pub fn completion_callback(&self) -> impl FnOnce() + Send + 'static {
        let player = self.clone();
        move || {
            if let Err(err) = player.play_chime() {
                warn!("Timer alert failed: {err:#}");
            }
        }
    }
}
