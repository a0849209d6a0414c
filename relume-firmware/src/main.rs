//! Relume - RLCD companion device firmware
//!
//! Main firmware binary for the ESP32-S3 desk device: a 400x300 1-bit
//! reflective LCD clock/assistant display, battery powered, with the
//! voice pipeline on a companion processor behind a UART link.
//!
//! Named after "relume" - to light again - for the way the reflective
//! panel redraws from ambient light instead of a backlight.

#![no_std]
#![no_main]

use core::cell::RefCell;

use embassy_executor::Spawner;
use embedded_hal_bus::i2c::RefCellDevice;
use embedded_hal_bus::spi::ExclusiveDevice;
use esp_backtrace as _;
use esp_hal::analog::adc::{Adc, AdcConfig, Attenuation};
use esp_hal::clock::CpuClock;
use esp_hal::delay::Delay;
use esp_hal::gpio::{Input, InputConfig, Level, Output, OutputConfig, Pull};
use esp_hal::i2c::master::I2c;
use esp_hal::spi::master::{Config as SpiConfig, Spi};
use esp_hal::spi::Mode as SpiMode;
use esp_hal::time::Rate;
use esp_hal::timer::timg::TimerGroup;
use esp_hal::uart::{Config as UartConfig, Uart};
use esp_hal::Blocking;
use esp_storage::FlashStorage;
use log::{info, warn};
use static_cell::StaticCell;

use relume_core::traits::KvStore;
use relume_display::{PanelDriver, SpiInterface, PANEL_HEIGHT, PANEL_WIDTH};

mod channels;
mod drivers;
mod link;
mod services;
mod tasks;
mod ui;

use drivers::battery::{AdcSampler, BatterySense};
use drivers::pcf85063::Pcf85063;
use drivers::shtc3::Shtc3;
use services::memostore::{FlashKv, CONTRAST_KEY, UI_NAMESPACE};
use ui::SharedScene;

/// SPI clock for the panel
const PANEL_SPI_MHZ: u32 = 40;
/// Link baud rate, matching the pipeline side
const LINK_BAUD: u32 = 115_200;

// Internal heap; the panel frame buffer and mapper LUT live in PSRAM
const HEAP_SIZE: usize = 72 * 1024;

static UI: StaticCell<SharedScene> = StaticCell::new();
static I2C_BUS: StaticCell<RefCell<I2c<'static, Blocking>>> = StaticCell::new();

#[esp_hal_embassy::main]
async fn main(spawner: Spawner) {
    esp_println::logger::init_logger_from_env();
    info!("relume firmware starting");

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    esp_alloc::heap_allocator!(size: HEAP_SIZE);
    esp_alloc::psram_allocator!(peripherals.PSRAM, esp_hal::psram);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_hal_embassy::init(timg0.timer0);
    info!("peripherals initialized");

    // Panel on SPI2
    let spi = Spi::new(
        peripherals.SPI2,
        SpiConfig::default()
            .with_frequency(Rate::from_mhz(PANEL_SPI_MHZ))
            .with_mode(SpiMode::_0),
    )
    .unwrap()
    .with_sck(peripherals.GPIO12)
    .with_mosi(peripherals.GPIO11);

    let cs = Output::new(peripherals.GPIO10, Level::High, OutputConfig::default());
    let dc = Output::new(peripherals.GPIO13, Level::Low, OutputConfig::default());
    let rst = Output::new(peripherals.GPIO14, Level::High, OutputConfig::default());

    let spi_device = ExclusiveDevice::new(spi, cs, Delay::new()).unwrap();
    let iface = SpiInterface::new(spi_device, dc, rst);

    let mut panel = PanelDriver::new(iface, PANEL_WIDTH, PANEL_HEIGHT).unwrap();
    let mut delay = Delay::new();
    panel.init(&mut delay).unwrap();
    info!("panel initialized");

    // Restore the persisted contrast before the first frame; the store
    // is dropped again before any task can touch flash
    {
        let kv = FlashKv::new(FlashStorage::new());
        let mut level = [0u8; 1];
        if kv.get(UI_NAMESPACE, CONTRAST_KEY, &mut level) == Some(1) {
            if panel.set_contrast(level[0]).is_err() {
                warn!("stored contrast rejected");
            }
        }
    }

    // RTC and environment sensor share I2C0
    let i2c = I2c::new(peripherals.I2C0, esp_hal::i2c::master::Config::default())
        .unwrap()
        .with_sda(peripherals.GPIO8)
        .with_scl(peripherals.GPIO9);
    let i2c_bus = I2C_BUS.init(RefCell::new(i2c));

    let rtc = Pcf85063::new(RefCellDevice::new(i2c_bus));
    let env = Shtc3::new(RefCellDevice::new(i2c_bus), Delay::new());

    // Battery sense on ADC1 plus the charger status pins
    let mut adc_config = AdcConfig::new();
    let sense_pin = adc_config.enable_pin(peripherals.GPIO4, Attenuation::_11dB);
    let adc = Adc::new(peripherals.ADC1, adc_config);
    let charging = Input::new(
        peripherals.GPIO5,
        InputConfig::default().with_pull(Pull::Up),
    );
    let discharging = Input::new(
        peripherals.GPIO6,
        InputConfig::default().with_pull(Pull::Up),
    );
    let battery = BatterySense::new(AdcSampler::new(adc, sense_pin), charging, discharging);

    // Assistant link on UART1
    let uart = Uart::new(
        peripherals.UART1,
        UartConfig::default().with_baudrate(LINK_BAUD),
    )
    .unwrap()
    .with_tx(peripherals.GPIO17)
    .with_rx(peripherals.GPIO18)
    .into_async();
    let (link_rx, link_tx) = uart.split();

    let button = Input::new(
        peripherals.GPIO0,
        InputConfig::default().with_pull(Pull::Up),
    );

    let ui = UI.init(SharedScene::new());

    spawner.spawn(tasks::render_task(ui, panel)).unwrap();
    spawner
        .spawn(tasks::update_task(ui, rtc, env, battery))
        .unwrap();
    spawner.spawn(tasks::button_task(ui, button)).unwrap();
    spawner.spawn(link::link_rx_task(link_rx, ui)).unwrap();
    spawner.spawn(link::link_tx_task(link_tx)).unwrap();

    info!("all tasks spawned");

    // All work happens in the spawned tasks
    loop {
        embassy_time::Timer::after_secs(60).await;
    }
}
