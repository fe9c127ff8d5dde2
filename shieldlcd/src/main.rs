mod config;

use crate::config::{Backend, Config};
use dotenv::dotenv;
use log::{debug, info};
use shieldlcd_pio::PioDriver;
use shieldlcd_pio::board::{AdcChipSelect, LCD_CONTROL_PORT, LCD_DATA_PORT, Shield};
use shieldlcd_pio::lcd::hd44780::driver::{HD44780Driver, PioHD44780Driver};
use shieldlcd_pio::lcd::hd44780::ext::DisplayExt;
use shieldlcd_pio::raw::RawPioDriver;
use shieldlcd_pio::recording::RecordingPioDriver;
use sysinfo::System;

fn run<P: PioDriver>(pio: &P, config: &Config) -> eyre::Result<()> {
    let data_port = pio.get_port(LCD_DATA_PORT)?;
    let control_port = pio.get_port(LCD_CONTROL_PORT)?;
    let lcd = PioHD44780Driver::new(&*data_port, &*control_port).with_timing(config.timing());

    let adc = AdcChipSelect;
    let mut shield = Shield::new(lcd).with_peripheral(&adc);

    debug!("Initializing shield...");
    shield.initialise(pio);
    debug!("{:?} initialized.", shield.lcd);

    for (row, line) in config.text.lines().enumerate() {
        shield.lcd.set_cursor(row, 0)?;
        if line.is_ascii() {
            shield.lcd.display(line.as_bytes());
        } else {
            shield.lcd.print(line);
        }
    }

    Ok(())
}

fn main() -> eyre::Result<()> {
    dotenv().ok();
    pretty_env_logger::init();

    const UNKNOWN_STR: &str = "???";

    info!(
        "shieldlcd v{} on {} ({})",
        env!("CARGO_PKG_VERSION"),
        System::host_name().as_deref().unwrap_or(UNKNOWN_STR),
        System::cpu_arch(),
    );

    let mut config = Config::load()?;
    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        config.text = args.join(" ");
    }
    debug!("{:?}", config);

    match config.backend {
        Backend::Raw => {
            info!("PIO @ {:#x} via {}", config.base_address, config.mem_path);
            let pio = RawPioDriver::create(&config.mem_path, config.layout())?;
            run(&pio, &config)?;
        }
        Backend::Recording => {
            info!("Recording backend, nothing is written to hardware");
            let pio = RecordingPioDriver::new();
            run(&pio, &config)?;
            for event in pio.events() {
                info!("{:?}", event);
            }
        }
    }

    info!("Done.");
    Ok(())
}
