//  \ O /
//  / * \    promising: settle-once promises on a cooperative microtask queue
// |' | '|   (c) 2020 - present, Vladimir Zvezda
//   / \

pub mod race_t;
pub mod timer_t;
pub mod unhandled_t;

pub mod measure;
