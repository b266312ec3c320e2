use cpal::{
    traits::{DeviceTrait, HostTrait, StreamTrait},
    Device, FromSample, SizedSample, Stream, StreamConfig,
};
use log::{error, info};

use super::{AudioOutput, PlaybackSource};

/// CPAL-backed audio output playing the engine's rendered kick.
pub struct CpalOutput {
    stream: Option<Stream>,
    device: Option<Device>,
    config: Option<StreamConfig>,
    sample_rate: f32,
    is_active: bool,
}

impl CpalOutput {
    pub fn new() -> Self {
        Self {
            stream: None,
            device: None,
            config: None,
            sample_rate: 44100.0,
            is_active: false,
        }
    }

    /// Build the output stream around the engine's [`PlaybackSource`].
    pub fn create_stream(&mut self, source: PlaybackSource) -> Result<(), anyhow::Error> {
        let device = self
            .device
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Device not initialized"))?;
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Config not initialized"))?;

        let supported_config = device.default_output_config()?;
        let stream = match supported_config.sample_format() {
            cpal::SampleFormat::I8 => Self::make_stream::<i8>(device, config, source)?,
            cpal::SampleFormat::I16 => Self::make_stream::<i16>(device, config, source)?,
            cpal::SampleFormat::I32 => Self::make_stream::<i32>(device, config, source)?,
            cpal::SampleFormat::I64 => Self::make_stream::<i64>(device, config, source)?,
            cpal::SampleFormat::U8 => Self::make_stream::<u8>(device, config, source)?,
            cpal::SampleFormat::U16 => Self::make_stream::<u16>(device, config, source)?,
            cpal::SampleFormat::U32 => Self::make_stream::<u32>(device, config, source)?,
            cpal::SampleFormat::U64 => Self::make_stream::<u64>(device, config, source)?,
            cpal::SampleFormat::F32 => Self::make_stream::<f32>(device, config, source)?,
            cpal::SampleFormat::F64 => Self::make_stream::<f64>(device, config, source)?,
            sample_format => {
                return Err(anyhow::anyhow!(
                    "Unsupported sample format '{}'",
                    sample_format
                ))
            }
        };

        self.stream = Some(stream);
        Ok(())
    }

    /// Setup the CPAL host and device
    fn setup_host_device(&mut self) -> Result<(), anyhow::Error> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or_else(|| anyhow::anyhow!("Default output device is not available"))?;
        info!("output device: {}", device.name()?);

        let config = device.default_output_config()?;
        info!("default output config: {:?}", config);

        self.sample_rate = config.sample_rate().0 as f32;
        self.device = Some(device);
        self.config = Some(config.into());

        Ok(())
    }

    /// Create a typed stream for the given sample format
    fn make_stream<T>(
        device: &Device,
        config: &StreamConfig,
        mut source: PlaybackSource,
    ) -> Result<Stream, anyhow::Error>
    where
        T: SizedSample + FromSample<f32>,
    {
        let num_channels = config.channels as usize;
        let err_fn = |err| error!("audio stream error: {}", err);

        // Mono scratch buffer, sized on the first callback and reused;
        // after that the callback allocates nothing.
        let mut mono: Vec<f32> = Vec::new();

        let stream = device.build_output_stream(
            config,
            move |output: &mut [T], _: &cpal::OutputCallbackInfo| {
                let frames = output.len() / num_channels;
                if mono.len() != frames {
                    mono.resize(frames, 0.0);
                }
                source.fill(&mut mono);

                for (frame, &value) in output.chunks_mut(num_channels).zip(mono.iter()) {
                    let sample = T::from_sample(value);
                    for out in frame.iter_mut() {
                        *out = sample;
                    }
                }
            },
            err_fn,
            None,
        )?;

        Ok(stream)
    }
}

impl Default for CpalOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioOutput for CpalOutput {
    fn initialize(&mut self, sample_rate: f32) -> Result<(), anyhow::Error> {
        self.sample_rate = sample_rate;
        self.setup_host_device()?;
        Ok(())
    }

    fn start(&mut self) -> Result<(), anyhow::Error> {
        match &self.stream {
            Some(stream) => {
                stream.play()?;
                self.is_active = true;
                info!("audio stream started at {} Hz", self.sample_rate);
                Ok(())
            }
            None => Err(anyhow::anyhow!(
                "Stream not created. Call create_stream first."
            )),
        }
    }

    fn stop(&mut self) -> Result<(), anyhow::Error> {
        if let Some(stream) = &self.stream {
            stream.pause()?;
            self.is_active = false;
            info!("audio stream stopped");
        }
        Ok(())
    }

    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn is_active(&self) -> bool {
        self.is_active
    }
}
