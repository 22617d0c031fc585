//! Pod controls wired to Raspberry Pi GPIO.

use std::{thread::sleep, time::Duration};

use rppal::gpio::{Gpio, InputPin, Level, OutputPin};
use tokio::sync::{mpsc, oneshot};

use crate::config::{EncoderPins, GpioConfig};
use crate::controls::{ButtonId, ControlEvent};
use crate::feedback::Indicator;

const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Gray-code step table indexed by `previous << 2 | current`.
const STEPS: [i8; 16] = [0, -1, 1, 0, 1, 0, 0, -1, -1, 0, 0, 1, 0, 1, -1, 0];
/// Quadrature steps per detent.
const STEPS_PER_DETENT: i8 = 4;

/// Quadrature decoder, independent of the pins it reads.
#[derive(Debug, Default, Clone, Copy)]
pub struct Quadrature {
    state: u8,
    steps: i8,
}

impl Quadrature {
    /// Feed the current A/B levels; returns a detent (+1 or -1) when one
    /// completes.
    pub fn update(&mut self, a: bool, b: bool) -> i32 {
        let current = (u8::from(a) << 1) | u8::from(b);
        let index = ((self.state << 2) | current) as usize;
        self.state = current;
        self.steps += STEPS[index];
        if self.steps >= STEPS_PER_DETENT {
            self.steps = 0;
            1
        } else if self.steps <= -STEPS_PER_DETENT {
            self.steps = 0;
            -1
        } else {
            0
        }
    }
}

struct Encoder {
    a: InputPin,
    b: InputPin,
    decoder: Quadrature,
}

impl Encoder {
    fn new(gpio: &Gpio, pins: EncoderPins) -> rppal::gpio::Result<Self> {
        Ok(Encoder {
            a: gpio.get(pins.a)?.into_input_pullup(),
            b: gpio.get(pins.b)?.into_input_pullup(),
            decoder: Quadrature::default(),
        })
    }

    fn poll(&mut self) -> i32 {
        self.decoder
            .update(self.a.read() == Level::Low, self.b.read() == Level::Low)
    }
}

struct Switch {
    pin: InputPin,
    last: bool,
}

impl Switch {
    fn new(gpio: &Gpio, pin: u8) -> rppal::gpio::Result<Self> {
        Ok(Switch {
            pin: gpio.get(pin)?.into_input_pullup(),
            last: false,
        })
    }

    /// New state if it changed since the last poll. Pressed pulls low.
    fn poll(&mut self) -> Option<bool> {
        let pressed = self.pin.read() == Level::Low;
        if pressed == self.last {
            return None;
        }
        self.last = pressed;
        Some(pressed)
    }
}

/// Claim the pins and poll them on a dedicated thread until `shutdown`
/// fires or the receiving side goes away.
pub fn spawn_poller(
    config: &GpioConfig,
    tx: mpsc::UnboundedSender<ControlEvent>,
    mut shutdown: oneshot::Receiver<()>,
) -> rppal::gpio::Result<std::thread::JoinHandle<()>> {
    let gpio = Gpio::new()?;
    let mut play = Switch::new(&gpio, config.play_button)?;
    let mut record = Switch::new(&gpio, config.record_button)?;
    let mut menu_press = Switch::new(&gpio, config.menu_press)?;
    let mut menu = Encoder::new(&gpio, config.menu_encoder)?;
    let mut mix = Encoder::new(&gpio, config.mix_encoder)?;

    let handle = std::thread::spawn(move || {
        log::info!("gpio poller started");
        loop {
            let mut events = [None; 5];
            events[0] = play.poll().map(|pressed| ControlEvent::Button {
                id: ButtonId::Play,
                pressed,
            });
            events[1] = record.poll().map(|pressed| ControlEvent::Button {
                id: ButtonId::Record,
                pressed,
            });
            events[2] = menu_press
                .poll()
                .filter(|pressed| *pressed)
                .map(|_| ControlEvent::MenuPress);
            events[3] = Some(menu.poll())
                .filter(|delta| *delta != 0)
                .map(ControlEvent::MenuTurn);
            events[4] = Some(mix.poll())
                .filter(|delta| *delta != 0)
                .map(ControlEvent::MixTurn);

            for event in events.into_iter().flatten() {
                if tx.send(event).is_err() {
                    log::info!("gpio poller stopping, receiver gone");
                    return;
                }
            }

            if shutdown.try_recv().is_ok() {
                break;
            }
            sleep(POLL_INTERVAL);
        }
        log::info!("gpio poller stopped");
    });
    Ok(handle)
}

/// Play and record LEDs.
pub struct GpioLeds {
    play: OutputPin,
    record: OutputPin,
}

impl GpioLeds {
    pub fn new(config: &GpioConfig) -> rppal::gpio::Result<Self> {
        let gpio = Gpio::new()?;
        Ok(GpioLeds {
            play: gpio.get(config.play_led)?.into_output_low(),
            record: gpio.get(config.record_led)?.into_output_low(),
        })
    }
}

impl Indicator for GpioLeds {
    fn set(&mut self, play: bool, record: bool) {
        self.play.write(Level::from(play));
        self.record.write(Level::from(record));
    }
}
