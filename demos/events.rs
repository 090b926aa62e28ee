//! Wait on the event channel, then read the full state.
//!
//! Usage: `cargo run --example events -- [id]`

use stickpoll::{Joystick, JoystickChannelled};

fn main() {
    env_logger::init();

    let id = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);

    let mut js = stickpoll::open_channelled(id).expect("open joystick");
    println!("{}", js.info());

    // Ends when the device goes away and the reader disconnects the channel.
    while let Ok(ev) = js.events().recv() {
        let kind = if ev.is_initial() { "init" } else { "event" };
        match js.read() {
            Ok(state) => println!("{kind} {:?} -> {:?}", ev.decode(), state),
            Err(e) => {
                eprintln!("read failed: {e}");
                break;
            }
        }
    }

    if let Err(e) = js.read() {
        eprintln!("joystick stopped: {e}");
    }
    js.close();
}
