#![allow(dead_code)]

use std::collections::VecDeque;
use std::error::Error;
use std::sync::Mutex;

use garden_pi::hardware::{Adc, AdcChannel, SensorSelector, WeatherSensor};
use garden_pi::models::WeatherReading;
use garden_pi::thingspeak::Transport;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    Select { low: bool, high: bool },
    Read(AdcChannel),
    Weather,
}

/// Hardware that replays queued ADC values and records every call
pub struct FakeHardware {
    adc_values: VecDeque<u16>,
    weather: WeatherReading,
    events: Vec<Event>,
}

impl FakeHardware {
    pub fn new(adc_values: Vec<u16>, weather: WeatherReading) -> FakeHardware {
        FakeHardware {
            adc_values: adc_values.into(),
            weather,
            events: Vec::new(),
        }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn selections(&self) -> Vec<(bool, bool)> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::Select { low, high } => Some((*low, *high)),
                _ => None,
            })
            .collect()
    }
}

impl Adc for FakeHardware {
    fn read(&mut self, channel: AdcChannel) -> Result<u16, Box<dyn Error>> {
        self.events.push(Event::Read(channel));
        self.adc_values
            .pop_front()
            .ok_or_else(|| "no more fake ADC values".into())
    }
}

impl SensorSelector for FakeHardware {
    fn select_lines(&mut self, low: bool, high: bool) -> Result<(), Box<dyn Error>> {
        self.events.push(Event::Select { low, high });
        Ok(())
    }
}

impl WeatherSensor for FakeHardware {
    async fn read_weather(&mut self) -> WeatherReading {
        self.events.push(Event::Weather);
        self.weather
    }
}

pub enum FakeResponse {
    Status(u16),
    ConnectionError,
}

/// Transport that answers with queued responses and records each form it gets
pub struct FakeTransport {
    responses: Mutex<VecDeque<FakeResponse>>,
    forms: Mutex<Vec<Vec<(&'static str, String)>>>,
}

impl FakeTransport {
    pub fn new(responses: Vec<FakeResponse>) -> FakeTransport {
        FakeTransport {
            responses: Mutex::new(responses.into()),
            forms: Mutex::new(Vec::new()),
        }
    }

    pub fn statuses(statuses: &[u16]) -> FakeTransport {
        FakeTransport::new(statuses.iter().map(|s| FakeResponse::Status(*s)).collect())
    }

    pub fn attempts(&self) -> usize {
        self.forms.lock().unwrap().len()
    }

    pub fn forms(&self) -> Vec<Vec<(&'static str, String)>> {
        self.forms.lock().unwrap().clone()
    }
}

impl Transport for FakeTransport {
    async fn post_form(&self, form: &[(&'static str, String)]) -> Result<u16, Box<dyn Error>> {
        self.forms.lock().unwrap().push(form.to_vec());
        match self.responses.lock().unwrap().pop_front() {
            Some(FakeResponse::Status(status)) => Ok(status),
            Some(FakeResponse::ConnectionError) => Err("connection refused".into()),
            None => panic!("transport called more often than expected"),
        }
    }
}
