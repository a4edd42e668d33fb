mod game_lifecycle;
mod history;
