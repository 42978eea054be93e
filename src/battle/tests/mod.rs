pub mod common;



#[cfg(test)]
mod test_specials;

#[cfg(test)]
mod test_stun;
