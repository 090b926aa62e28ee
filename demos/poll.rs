//! Print joystick state whenever it changes.
//!
//! Usage: `cargo run --example poll -- [id]`

use stickpoll::Joystick;

fn main() {
    env_logger::init();

    let id = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);

    let mut js = stickpoll::open(id).expect("open joystick");
    println!("Joystick Name: {}", js.name());
    println!("   Axis Count: {}", js.axis_count());
    println!(" Button Count: {}", js.button_count());

    let mut last = None;
    loop {
        match js.read() {
            Ok(state) => {
                if last.as_ref() != Some(&state) {
                    println!("axes={:?} buttons={:032b}", state.axis_data, state.buttons);
                    last = Some(state);
                }
            }
            Err(e) => {
                eprintln!("read failed: {e}");
                break;
            }
        }
        // Sleep a touch to avoid pegging the CPU in the demo
        std::thread::sleep(std::time::Duration::from_millis(5));
    }

    js.close();
}
