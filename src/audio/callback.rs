use std::sync::TryLockError;

use crate::engine::SharedEngine;

pub struct AudioCallbackSettings {
    pub in_port: jack::Port<jack::AudioIn>,
    pub out_port: jack::Port<jack::AudioOut>,
    pub engine: SharedEngine,
}

/// One period of audio. Never waits for the engine: while the poll side
/// holds it the input is passed through dry.
pub fn run_block(engine: &SharedEngine, input: &[f32], output: &mut [f32]) {
    match engine.try_lock() {
        Ok(mut engine) => engine.process_block(input, output),
        Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner().process_block(input, output),
        Err(TryLockError::WouldBlock) => output.copy_from_slice(input),
    }
}

pub fn create_callback(settings: AudioCallbackSettings) -> impl jack::ProcessHandler {
    let AudioCallbackSettings {
        in_port,
        mut out_port,
        engine,
    } = settings;

    let callback_closure = move |_: &jack::Client, ps: &jack::ProcessScope| {
        run_block(&engine, in_port.as_slice(ps), out_port.as_mut_slice(ps));
        jack::Control::Continue
    };

    jack::contrib::ClosureProcessHandler::new(callback_closure)
}
