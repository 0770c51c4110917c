// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::{
    error::Error,
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc, Arc,
    },
    thread,
    time::Duration,
};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SizedSample};
use tracing::{debug, error, info, span, Level};

use crate::audio::mixer::{ActiveSource, AudioMixer};
use crate::audio::sample_source::MemorySampleSource;
use crate::audio::{next_source_id, Device as AudioDevice, DeviceInfo};
use crate::config;

/// A small wrapper around a cpal::Device that keeps an output stream open for the
/// lifetime of the program and mixes every played sample into it.
pub struct Device {
    /// The name of the device.
    name: String,
    /// The host ID of the device.
    host_id: cpal::HostId,
    /// The number of output channels of the stream.
    channels: u16,
    /// The sample rate of the stream.
    sample_rate: u32,
    /// The output stream manager for continuous playback.
    output_manager: OutputManager,
}

/// Manages the continuous output stream and mixing of multiple audio sources.
struct OutputManager {
    /// The core audio mixer
    mixer: AudioMixer,
    /// Channel for handing new sources to the audio callback.
    source_tx: crossbeam_channel::Sender<ActiveSource>,
    /// Cleared to close the stream.
    running: Arc<AtomicBool>,
    /// Handle to the output thread (keeps the stream alive).
    output_thread: Option<thread::JoinHandle<()>>,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Channels={}) ({})",
            self.name,
            self.channels,
            self.host_id.name()
        )
    }
}

/// Builds the audio callback for the given output sample type. New sources are picked
/// up at the start of every block so the callback never waits on the caller.
fn create_callback<T>(
    mixer: AudioMixer,
    source_rx: crossbeam_channel::Receiver<ActiveSource>,
) -> impl FnMut(&mut [T], &cpal::OutputCallbackInfo) + Send + 'static
where
    T: SizedSample + FromSample<f32>,
{
    let channels = mixer.num_channels().max(1) as usize;
    let mut scratch: Vec<f32> = Vec::new();
    move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
        while let Ok(source) = source_rx.try_recv() {
            mixer.add_source(source);
        }

        scratch.resize(data.len(), 0.0);
        mixer.process_into_output(&mut scratch, data.len() / channels);
        for (dst, &src) in data.iter_mut().zip(scratch.iter()) {
            *dst = T::from_sample(src.clamp(-1.0, 1.0));
        }
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mixer: AudioMixer,
    source_rx: crossbeam_channel::Receiver<ActiveSource>,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: SizedSample + FromSample<f32>,
{
    device.build_output_stream(
        config,
        create_callback::<T>(mixer, source_rx),
        |err| error!("CPAL output stream error: {}", err),
        None,
    )
}

impl Drop for OutputManager {
    fn drop(&mut self) {
        self.mixer.clear();
        self.running.store(false, Ordering::Relaxed);
        if let Some(thread) = self.output_thread.take() {
            let _ = thread.join();
        }
    }
}

impl OutputManager {
    /// Starts the output thread that creates and owns the cpal stream. Waits until the
    /// stream is playing, or returns the reason it couldn't be started.
    fn start(
        device: cpal::Device,
        config: cpal::StreamConfig,
        sample_format: cpal::SampleFormat,
    ) -> Result<OutputManager, Box<dyn Error>> {
        let (source_tx, source_rx) = crossbeam_channel::unbounded();
        let mixer = AudioMixer::new(config.channels);
        let running = Arc::new(AtomicBool::new(true));
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), String>>();

        let output_thread = {
            let mixer = mixer.clone();
            let running = running.clone();
            thread::spawn(move || {
                let span = span!(Level::INFO, "output thread");
                let _enter = span.enter();

                let stream_result = match sample_format {
                    cpal::SampleFormat::F32 => {
                        build_stream::<f32>(&device, &config, mixer, source_rx)
                    }
                    cpal::SampleFormat::I16 => {
                        build_stream::<i16>(&device, &config, mixer, source_rx)
                    }
                    cpal::SampleFormat::I32 => {
                        build_stream::<i32>(&device, &config, mixer, source_rx)
                    }
                    cpal::SampleFormat::U16 => {
                        build_stream::<u16>(&device, &config, mixer, source_rx)
                    }
                    other => {
                        let _ = ready_tx.send(Err(format!("unsupported sample format {other}")));
                        return;
                    }
                };

                let stream = match stream_result {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = ready_tx.send(Err(format!("failed to create stream: {e}")));
                        return;
                    }
                };
                if let Err(e) = stream.play() {
                    let _ = ready_tx.send(Err(format!("failed to start stream: {e}")));
                    return;
                }
                info!("CPAL output stream started successfully");
                let _ = ready_tx.send(Ok(()));

                // The stream stops when it is dropped, so hold it here.
                while running.load(Ordering::Relaxed) {
                    thread::sleep(Duration::from_millis(100));
                }
                debug!("CPAL output stream closing");
            })
        };

        ready_rx.recv()??;

        Ok(OutputManager {
            mixer,
            source_tx,
            running,
            output_thread: Some(output_thread),
        })
    }

    /// Adds a new audio source to be played.
    fn add_source(&self, source: ActiveSource) -> Result<(), Box<dyn Error>> {
        self.source_tx.send(source)?;
        Ok(())
    }
}

impl Device {
    /// Lists cpal output devices.
    pub fn list() -> Result<Vec<DeviceInfo>, Box<dyn Error>> {
        Ok(Device::list_cpal_devices()?
            .into_iter()
            .map(|(host_id, device)| DeviceInfo {
                name: device.name().unwrap_or_default(),
                host: host_id.name().to_string(),
                max_channels: device
                    .supported_output_configs()
                    .map(|configs| configs.map(|c| c.channels()).max().unwrap_or(0))
                    .unwrap_or(0),
            })
            .filter(|info| info.max_channels > 0)
            .collect())
    }

    /// Lists the output devices of every available host.
    fn list_cpal_devices() -> Result<Vec<(cpal::HostId, cpal::Device)>, Box<dyn Error>> {
        // Suppress noisy output here.
        let _shh_stdout = shh::stdout()?;
        let _shh_stderr = shh::stderr()?;

        let mut devices = Vec::new();
        for host_id in cpal::available_hosts() {
            let host_devices = match cpal::host_from_id(host_id)?.output_devices() {
                Ok(host_devices) => host_devices,
                Err(e) => {
                    error!(
                        err = e.to_string(),
                        host = host_id.name(),
                        "Unable to list devices for host"
                    );
                    continue;
                }
            };
            devices.extend(host_devices.map(|device| (host_id, device)));
        }
        Ok(devices)
    }

    /// Opens the configured device, or the host's default output device.
    pub fn get(config: &config::Audio) -> Result<Device, Box<dyn Error>> {
        let (host_id, device) = if config.is_default_device() {
            let host = cpal::default_host();
            let device = host
                .default_output_device()
                .ok_or("no default audio output device")?;
            (host.id(), device)
        } else {
            let name = config.device();
            Device::list_cpal_devices()?
                .into_iter()
                .find(|(_, device)| device.name().is_ok_and(|n| n.trim() == name))
                .ok_or_else(|| format!("no device found with name {}", name))?
        };

        let name = device.name()?;
        let supported = device.default_output_config()?;
        let sample_format = supported.sample_format();
        let mut stream_config = supported.config();
        if let Some(sample_rate) = config.sample_rate() {
            stream_config.sample_rate = sample_rate;
        }
        stream_config.buffer_size = cpal::BufferSize::Default;

        info!(
            device = name,
            host = host_id.name(),
            channels = stream_config.channels,
            sample_rate = stream_config.sample_rate,
            format = sample_format.to_string(),
            "Opening audio output."
        );

        let channels = stream_config.channels;
        let sample_rate = stream_config.sample_rate;
        let output_manager = OutputManager::start(device, stream_config, sample_format)?;

        Ok(Device {
            name,
            host_id,
            channels,
            sample_rate,
            output_manager,
        })
    }
}

impl AudioDevice for Device {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn play(&self, source: MemorySampleSource) -> Result<u64, Box<dyn Error>> {
        let id = next_source_id();
        debug!(
            device = self.name,
            source_id = id,
            frames = source.total_frames(),
            "Playing sample."
        );
        self.output_manager.add_source(ActiveSource { id, source })?;
        Ok(id)
    }

    #[cfg(test)]
    fn to_mock(&self) -> Result<Arc<super::mock::Device>, Box<dyn Error>> {
        Err("not a mock".into())
    }
}
