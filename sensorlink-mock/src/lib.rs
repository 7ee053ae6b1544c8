use std::sync::Arc;
use std::time::Duration;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use sensorlink_embedded::power::{AdcSampler, CalibrationTable, PowerConfig, PowerMonitor, PowerService};
use sensorlink_embedded::sensor::{Dht11Driver, GatedSensor, SensorConfig, SensorPoller};
use sensorlink_embedded::tools::SensorTools;
use tokio::time;

use crate::hardware::{BatteryCell, ChargeLine, MockBatteryAdc, MockChargePin, MockDht11};
use crate::settings::Settings;

pub mod hardware;
pub mod settings;

type PowerStack = PowerService<CriticalSectionRawMutex, MockBatteryAdc, MockChargePin>;
type SensorStack = GatedSensor<CriticalSectionRawMutex, MockDht11>;
type PollerStack = SensorPoller<CriticalSectionRawMutex, MockDht11>;

/// Fully charged 18650 through the onboard divider lands around here.
const CELL_FULL_RAW: u16 = 3940;
const CELL_START_RAW: u16 = 3400;
const CHARGE_PER_STEP: u16 = 120;

pub async fn run(settings: &Arc<Settings>) {
    let simulation = settings.simulation.clone();

    let cell = BatteryCell::new(CELL_START_RAW);
    let charge_line = ChargeLine::new();

    let monitor = PowerMonitor::new(
        AdcSampler::new(MockBatteryAdc::new(cell.clone(), simulation.adc_noise_sigma)),
        MockChargePin::new(charge_line.clone()),
        CalibrationTable::default(),
        PowerConfig::default(),
    );

    let power: Arc<PowerStack> = Arc::new(PowerService::new(monitor));
    power.on_charging_status_changed(|charging| {
        tracing::info!("charging status changed: {}", charging);
    });
    power.on_low_battery_status_changed(|low| {
        tracing::warn!("low battery status changed: {}", low);
    });

    let sensor_config = SensorConfig {
        read_interval_ms: (simulation.control_interval_secs * 1000) as u32,
        ..SensorConfig::default()
    };
    let sensor: Arc<SensorStack> = Arc::new(GatedSensor::new(Dht11Driver::with_config(
        MockDht11::new(simulation.dht_fault_rate),
        sensor_config,
    )));
    let poller: Arc<PollerStack> =
        Arc::new(SensorPoller::new(sensor.clone(), sensor.read_interval()));
    let tools = SensorTools::new(sensor.clone(), poller.clone());

    {
        let power = power.clone();
        tokio::spawn(async move { power.run().await });
    }
    {
        let poller = poller.clone();
        tokio::spawn(async move { poller.run().await });
    }

    tracing::info!("{}", tools.enable_sensor());

    let mut control = time::interval(Duration::from_secs(simulation.control_interval_secs.max(1)));
    let deadline = time::Instant::now() + Duration::from_secs(simulation.runtime_secs);

    while time::Instant::now() < deadline {
        control.tick().await;

        if charge_line.is_plugged() {
            cell.charge(CHARGE_PER_STEP);
            if cell.raw() >= CELL_FULL_RAW {
                charge_line.unplug();
                tracing::info!("charger unplugged at raw {}", cell.raw());
            }
        } else {
            cell.drain(simulation.drain_per_step);
            if power.is_low_battery() {
                charge_line.plug();
                tracing::info!("charger plugged at raw {}", cell.raw());
            }
        }

        tracing::info!(
            "battery level {}% ({:.2} V, raw {}), charging: {}, discharging: {}",
            power.battery_level(),
            power.battery_voltage(),
            power.raw_adc_value(),
            power.is_charging(),
            power.is_discharging(),
        );
        tracing::info!(
            "temperature {} C, humidity {} %",
            tools.get_temperature(),
            tools.get_humidity(),
        );
        tracing::debug!("sensor status: {}", tools.get_sensor_status());
        tracing::debug!("reading status: {}", tools.get_combined_status());
    }

    tracing::info!("{}", tools.disable_sensor());
}
