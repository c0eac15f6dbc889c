/// Arcade-style maze with a side tunnel on row 14 and a holding pen under the
/// Direct pursuer.
pub const CLASSIC: &str = concat!(
    "############################\n",
    "#............##............#\n",
    "#.####.#####.##.#####.####.#\n",
    "#o####.#####.##.#####.####o#\n",
    "#.####.#####.##.#####.####.#\n",
    "#..........................#\n",
    "#.####.##.########.##.####.#\n",
    "#.####.##.########.##.####.#\n",
    "#......##....##....##......#\n",
    "######.##### ## #####.######\n",
    "######.##### ## #####.######\n",
    "######.##    1     ##.######\n",
    "######.## ##    ## ##.######\n",
    "######.## ##2 34## ##.######\n",
    "      .   ########   .      \n",
    "######.##          ##.######\n",
    "######.## ######## ##.######\n",
    "######.## ######## ##.######\n",
    "#............##............#\n",
    "#.####.#####.##.#####.####.#\n",
    "#.####.#####.##.#####.####.#\n",
    "#o..##.......P........##..o#\n",
    "###.##.##.########.##.##.###\n",
    "###.##.##.########.##.##.###\n",
    "#......##....##....##......#\n",
    "#.##########.##.##########.#\n",
    "#.##########.##.##########.#\n",
    "#..........................#\n",
    "############################\n",
);

/// Small open room used by the simulator smoke run.
pub const OPEN_ROOM: &str = concat!(
    "###########\n",
    "#.........#\n",
    "#.o.....o.#\n",
    "#...1.....#\n",
    "#.........#\n",
    "#....P....#\n",
    "###########\n",
);
