use colored::Colorize;

const BANNER: [&str; 5] = [
    "█▄ █ █▀█ █▀▄ █▀▀     █ █▀▀",
    "█ ▀█ █▄█ █▄▀ ██▄   █▄█ ▄▄█",
    "",
    "█▄▀ █ █▀▀ █▄▀ █▀█ █▀▀ █▀▀",
    "█ █ █ █▄▄ █ █ █▄█ █▀  █▀ ",
];

pub fn print() {
    println!();
    for line in BANNER {
        println!("  {}", line.green().bold());
    }
    println!();
}
