//! Output device diagnostics (`--audio-info`).

use cpal::traits::{DeviceTrait, HostTrait};

/// Logs every output device of the default host and its default config
pub fn log_audio_info() {
    let host = cpal::default_host();
    println!("\n=== Audio Output Devices ({:?}) ===\n", host.id());

    let default_name = host.default_output_device().and_then(|d| d.name().ok());

    match host.output_devices() {
        Ok(devices) => {
            let mut count = 0;
            for (idx, device) in devices.enumerate() {
                let name = device.name().unwrap_or_else(|_| "<unnamed>".to_string());
                let marker = if Some(&name) == default_name.as_ref() {
                    " (default)"
                } else {
                    ""
                };
                println!("  [{}] {}{}", idx, name, marker);
                match device.default_output_config() {
                    Ok(config) => println!(
                        "      {} Hz, {} channels, {:?}",
                        config.sample_rate().0,
                        config.channels(),
                        config.sample_format()
                    ),
                    Err(e) => println!("      (no default config: {})", e),
                }
                count += 1;
            }
            if count == 0 {
                println!("  (none found)");
            }
        }
        Err(e) => eprintln!("  Failed to enumerate output devices: {}", e),
    }

    println!("\n=== End Diagnostics ===\n");
}
